use axum::extract::{Path, State};
use axum::Json;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use amoura_shared::errors::{AppError, AppResult, ErrorCode};
use amoura_shared::types::auth::AuthUser;
use amoura_shared::types::{ApiResponse, MemberSnapshot};

use crate::events::publisher;
use crate::models::{Favorite, NewFavorite};
use crate::routes::internal::load_snapshots;
use crate::routes::profile::require_member;
use crate::schema::favorites;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AddFavoriteRequest {
    pub member_ref: String,
}

/// POST /favorites - like a member
pub async fn add_favorite(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<AddFavoriteRequest>,
) -> AppResult<Json<ApiResponse<Favorite>>> {
    if req.member_ref == user.member_ref {
        return Err(AppError::new(ErrorCode::CannotLikeSelf, "you cannot like yourself"));
    }

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let liker = require_member(&mut conn, &user.member_ref)?;
    require_member(&mut conn, &req.member_ref)?;

    // One edge per pair; a repeat like returns the existing edge
    let existing = favorites::table
        .filter(favorites::liked_by.eq(&user.member_ref))
        .filter(favorites::liked_user.eq(&req.member_ref))
        .first::<Favorite>(&mut conn)
        .optional()?;

    if let Some(edge) = existing {
        return Ok(Json(ApiResponse::ok(edge)));
    }

    let new_edge = NewFavorite {
        liked_by: user.member_ref.clone(),
        liked_user: req.member_ref.clone(),
    };

    let edge = diesel::insert_into(favorites::table)
        .values(&new_edge)
        .get_result::<Favorite>(&mut conn)?;

    let display_name = liker.display_name.as_deref().unwrap_or("Someone");
    publisher::publish_favorite_added(
        &state.rabbitmq,
        &user.member_ref,
        &req.member_ref,
        display_name,
    )
    .await;

    Ok(Json(ApiResponse::ok(edge)))
}

#[derive(Debug, Serialize)]
pub struct RemoveFavoriteResponse {
    pub removed: bool,
}

/// DELETE /favorites/:member_ref - unlike a member
pub async fn remove_favorite(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(member_ref): Path<String>,
) -> AppResult<Json<ApiResponse<RemoveFavoriteResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let deleted = diesel::delete(
        favorites::table
            .filter(favorites::liked_by.eq(&user.member_ref))
            .filter(favorites::liked_user.eq(&member_ref)),
    )
    .execute(&mut conn)?;

    if deleted == 0 {
        return Err(AppError::new(ErrorCode::FavoriteNotFound, "favorite not found"));
    }

    publisher::publish_favorite_removed(&state.rabbitmq, &user.member_ref, &member_ref).await;

    Ok(Json(ApiResponse::ok(RemoveFavoriteResponse { removed: true })))
}

/// GET /favorites - members I liked
pub async fn list_favorites(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<MemberSnapshot>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let refs: Vec<String> = favorites::table
        .filter(favorites::liked_by.eq(&user.member_ref))
        .order(favorites::created_at.desc())
        .select(favorites::liked_user)
        .load::<String>(&mut conn)?;

    let snapshots = load_snapshots(&state, &mut conn, &refs).await?;
    Ok(Json(ApiResponse::ok(snapshots)))
}

/// GET /favorites/incoming - members who like me
pub async fn list_incoming_favorites(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<MemberSnapshot>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let refs: Vec<String> = favorites::table
        .filter(favorites::liked_user.eq(&user.member_ref))
        .order(favorites::created_at.desc())
        .select(favorites::liked_by)
        .load::<String>(&mut conn)?;

    let snapshots = load_snapshots(&state, &mut conn, &refs).await?;
    Ok(Json(ApiResponse::ok(snapshots)))
}
