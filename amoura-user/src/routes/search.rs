use axum::extract::{Query, State};
use axum::Json;
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;

use amoura_shared::errors::{AppError, AppResult};
use amoura_shared::types::auth::AuthUser;
use amoura_shared::types::{ApiResponse, MemberSnapshot};

use crate::models::Profile;
use crate::schema::profiles;
use crate::AppState;

#[derive(Deserialize)]
pub struct SearchParams {
    q: String,
    #[serde(default = "default_limit")]
    limit: i64,
}

fn default_limit() -> i64 {
    20
}

/// GET /search?q=<query>&limit=20 - name search over discoverable profiles
pub async fn search_members(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<ApiResponse<Vec<MemberSnapshot>>>> {
    let query = params.q.trim().to_string();
    if query.is_empty() {
        return Ok(Json(ApiResponse::ok(vec![])));
    }

    let limit = params.limit.clamp(1, 50);
    let pattern = format!("%{}%", query);

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let results: Vec<Profile> = profiles::table
        .filter(profiles::display_name.ilike(&pattern))
        .filter(profiles::member_ref.ne(&user.member_ref))
        .filter(profiles::profile_discovery.eq(true))
        .filter(profiles::onboarding_complete.eq(true))
        .limit(limit)
        .load::<Profile>(&mut conn)
        .map_err(|e| AppError::internal(e.to_string()))?;

    // Presence from Redis (source of truth), falling back to the DB flag
    let keys: Vec<String> = results.iter().map(|p| format!("online:{}", p.member_ref)).collect();
    let online = state
        .redis
        .exists_multi(&keys)
        .await
        .unwrap_or_else(|_| vec![false; results.len()]);

    let snapshots = results
        .into_iter()
        .zip(online.into_iter().chain(std::iter::repeat(false)))
        .map(|(p, is_online)| MemberSnapshot {
            photo_url: p.primary_photo(),
            member_ref: p.member_ref,
            display_name: p.display_name,
            city: p.city,
            is_online: is_online || p.is_online,
        })
        .collect();

    Ok(Json(ApiResponse::ok(snapshots)))
}
