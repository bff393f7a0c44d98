use axum::extract::State;
use axum::Json;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use amoura_shared::errors::{AppError, AppResult, ErrorCode};
use amoura_shared::types::auth::AuthUser;
use amoura_shared::types::{ApiResponse, MemberSnapshot};

use crate::events::publisher;
use crate::models::{Block, NewBlock};
use crate::routes::internal::load_snapshots;
use crate::schema::blocks;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ToggleBlockRequest {
    pub member_ref: String,
}

#[derive(Debug, Serialize)]
pub struct ToggleBlockResponse {
    pub member_ref: String,
    pub blocked: bool,
}

/// POST /blocks/toggle - block or unblock a member.
///
/// Toggling twice restores the original state. The confirmation step before
/// a block is a client concern; unblock never asks.
pub async fn toggle_block(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<ToggleBlockRequest>,
) -> AppResult<Json<ApiResponse<ToggleBlockResponse>>> {
    if req.member_ref == user.member_ref {
        return Err(AppError::new(ErrorCode::CannotBlockSelf, "you cannot block yourself"));
    }

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let existing = blocks::table
        .filter(blocks::blocker.eq(&user.member_ref))
        .filter(blocks::blocked.eq(&req.member_ref))
        .first::<Block>(&mut conn)
        .optional()?;

    let blocked_now = match existing {
        Some(edge) => {
            diesel::delete(blocks::table.find(edge.id)).execute(&mut conn)?;
            false
        }
        None => {
            let new_edge = NewBlock {
                blocker: user.member_ref.clone(),
                blocked: req.member_ref.clone(),
            };
            diesel::insert_into(blocks::table)
                .values(&new_edge)
                .execute(&mut conn)?;
            true
        }
    };

    publisher::publish_block_changed(&state.rabbitmq, &user.member_ref, &req.member_ref, blocked_now)
        .await;

    tracing::info!(
        blocker = %user.member_ref,
        blocked = %req.member_ref,
        blocked_now = blocked_now,
        "block toggled"
    );

    Ok(Json(ApiResponse::ok(ToggleBlockResponse {
        member_ref: req.member_ref,
        blocked: blocked_now,
    })))
}

/// GET /blocks - members I have blocked
pub async fn list_blocks(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<MemberSnapshot>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let refs: Vec<String> = blocks::table
        .filter(blocks::blocker.eq(&user.member_ref))
        .order(blocks::created_at.desc())
        .select(blocks::blocked)
        .load::<String>(&mut conn)?;

    let snapshots = load_snapshots(&state, &mut conn, &refs).await?;
    Ok(Json(ApiResponse::ok(snapshots)))
}
