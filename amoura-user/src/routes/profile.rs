use axum::extract::{Path, State};
use axum::Json;
use chrono::NaiveDate;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use amoura_shared::errors::{AppError, AppResult, ErrorCode};
use amoura_shared::types::auth::AuthUser;
use amoura_shared::types::ApiResponse;

use crate::events::publisher;
use crate::models::{Profile, UpdateProfile};
use crate::schema::{favorites, profiles};
use crate::services::profile_service;
use crate::AppState;

// --- GET /me ---

pub async fn get_profile(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Profile>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let profile = profiles::table
        .filter(profiles::member_ref.eq(&user.member_ref))
        .first::<Profile>(&mut conn)
        .map_err(|_| AppError::new(ErrorCode::ProfileNotFound, "profile not found"))?;

    Ok(Json(ApiResponse::ok(profile)))
}

// --- PATCH /me ---

pub async fn update_profile(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(payload): Json<UpdateProfile>,
) -> AppResult<Json<ApiResponse<Profile>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let profile = profiles::table
        .filter(profiles::member_ref.eq(&user.member_ref))
        .first::<Profile>(&mut conn)
        .map_err(|_| AppError::new(ErrorCode::ProfileNotFound, "profile not found"))?;

    let updated = diesel::update(profiles::table.filter(profiles::id.eq(profile.id)))
        .set((
            &payload,
            profiles::updated_at.eq(chrono::Utc::now()),
        ))
        .get_result::<Profile>(&mut conn)?;

    publisher::publish_profile_updated(
        &state.rabbitmq,
        &updated.member_ref,
        updated.display_name.as_deref(),
        updated.primary_photo().as_deref(),
    )
    .await;

    Ok(Json(ApiResponse::ok(updated)))
}

// --- POST /onboarding ---

#[derive(Debug, Deserialize, Validate)]
pub struct OnboardingRequest {
    #[validate(length(min = 2, max = 50, message = "display name must be between 2 and 50 characters"))]
    pub display_name: String,
    pub birth_date: String,
    pub gender: String,
    pub gender_preference: String,
    pub day_job: Option<String>,
    pub religion: Option<String>,
    pub degree: Option<String>,
    pub origin_country: Option<String>,
    pub settled_country: Option<String>,
    pub city: Option<String>,
    pub mother_tongue: Option<String>,
    pub star_sign: Option<String>,
    #[serde(default)]
    pub passions: Vec<String>,
    #[serde(default)]
    pub interests: Vec<String>,
}

/// Everything onboarding writes in one changeset.
#[derive(AsChangeset)]
#[diesel(table_name = profiles)]
struct OnboardingChangeset {
    display_name: String,
    birth_date: NaiveDate,
    gender: String,
    gender_preference: String,
    day_job: Option<String>,
    religion: Option<String>,
    degree: Option<String>,
    origin_country: Option<String>,
    settled_country: Option<String>,
    city: Option<String>,
    mother_tongue: Option<String>,
    star_sign: Option<String>,
    passions: serde_json::Value,
    interests: serde_json::Value,
    profile_discovery: bool,
    onboarding_complete: bool,
    updated_at: chrono::DateTime<chrono::Utc>,
}

pub async fn complete_onboarding(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<OnboardingRequest>,
) -> AppResult<Json<ApiResponse<Profile>>> {
    req.validate()
        .map_err(|e| AppError::new(ErrorCode::ValidationError, e.to_string()))?;
    let display_name = req.display_name.trim().to_string();

    let birth_date = NaiveDate::parse_from_str(&req.birth_date, "%Y-%m-%d")
        .map_err(|_| AppError::new(ErrorCode::ValidationError, "invalid birth_date format, expected YYYY-MM-DD"))?;

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let profile = profiles::table
        .filter(profiles::member_ref.eq(&user.member_ref))
        .first::<Profile>(&mut conn)
        .map_err(|_| AppError::new(ErrorCode::ProfileNotFound, "profile not found"))?;

    let passions_json = serde_json::to_value(&req.passions)
        .map_err(|e| AppError::internal(e.to_string()))?;
    let interests_json = serde_json::to_value(&req.interests)
        .map_err(|e| AppError::internal(e.to_string()))?;

    let changeset = OnboardingChangeset {
        display_name: display_name.clone(),
        birth_date,
        gender: req.gender,
        gender_preference: req.gender_preference,
        day_job: req.day_job,
        religion: req.religion,
        degree: req.degree,
        origin_country: req.origin_country,
        settled_country: req.settled_country,
        city: req.city,
        mother_tongue: req.mother_tongue,
        star_sign: req.star_sign,
        passions: passions_json,
        interests: interests_json,
        profile_discovery: true,
        onboarding_complete: true,
        updated_at: chrono::Utc::now(),
    };

    let updated = diesel::update(profiles::table.filter(profiles::id.eq(profile.id)))
        .set(&changeset)
        .get_result::<Profile>(&mut conn)?;

    publisher::publish_profile_updated(
        &state.rabbitmq,
        &updated.member_ref,
        updated.display_name.as_deref(),
        updated.primary_photo().as_deref(),
    )
    .await;

    tracing::info!(
        member_ref = %user.member_ref,
        display_name = %display_name,
        "onboarding completed"
    );

    Ok(Json(ApiResponse::ok(updated)))
}

// --- GET /members/:member_ref ---

/// Public profile by member reference. Hidden profiles are only visible to
/// themselves and to members they share a favorite edge with.
pub async fn get_public_profile(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(member_ref): Path<String>,
) -> AppResult<Json<ApiResponse<Profile>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let mut profile = profiles::table
        .filter(profiles::member_ref.eq(&member_ref))
        .first::<Profile>(&mut conn)
        .map_err(|_| AppError::new(ErrorCode::ProfileNotFound, "profile not found"))?;

    if !profile.profile_discovery && profile.member_ref != user.member_ref {
        let related: i64 = favorites::table
            .filter(
                favorites::liked_by
                    .eq(&user.member_ref)
                    .and(favorites::liked_user.eq(&member_ref))
                    .or(favorites::liked_by
                        .eq(&member_ref)
                        .and(favorites::liked_user.eq(&user.member_ref))),
            )
            .count()
            .get_result(&mut conn)?;

        if related == 0 {
            return Err(AppError::new(ErrorCode::ProfileHidden, "this profile is not discoverable"));
        }
    }

    // Presence comes from Redis, not the stale DB column
    let key = format!("online:{}", profile.member_ref);
    if let Ok(true) = state.redis.exists(&key).await {
        profile.is_online = true;
    }

    Ok(Json(ApiResponse::ok(profile)))
}

// --- DELETE /me ---

#[derive(Debug, Serialize)]
pub struct DeleteAccountResponse {
    pub deleted: bool,
}

pub async fn delete_account(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<DeleteAccountResponse>>> {
    profile_service::delete_account(&state.db, &user.member_ref)?;

    let _ = state.redis.del(&format!("online:{}", user.member_ref)).await;

    publisher::publish_account_deleted(&state.rabbitmq, &user.member_ref).await;

    Ok(Json(ApiResponse::ok(DeleteAccountResponse { deleted: true })))
}

// --- Edge ownership helpers used by other route modules ---

/// Ensure a target member exists, returning its profile.
pub fn require_member(
    conn: &mut diesel::pg::PgConnection,
    member_ref: &str,
) -> AppResult<Profile> {
    profiles::table
        .filter(profiles::member_ref.eq(member_ref))
        .first::<Profile>(conn)
        .map_err(|_| AppError::new(ErrorCode::ProfileNotFound, "member not found"))
}

