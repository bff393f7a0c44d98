use axum::extract::{Path, State};
use axum::Json;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use amoura_shared::errors::{AppError, AppResult, ErrorCode};
use amoura_shared::types::auth::AuthUser;
use amoura_shared::types::{ApiResponse, MemberSnapshot};

use crate::events::publisher;
use crate::models::{NewShortlist, Shortlist};
use crate::routes::internal::load_snapshots;
use crate::routes::profile::require_member;
use crate::schema::shortlists;
use crate::AppState;

/// New shortlist refs use the composite `{owner}-{suffix}` convention.
/// Historic rows may carry a bare random suffix; reads must accept both.
pub fn new_doc_ref(owner: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{owner}-{}", &suffix[..12])
}

/// Owner encoded in a shortlist ref, when the composite convention was used.
/// Bare legacy refs yield `None`; the row's own column is authoritative then.
pub fn owner_from_doc_ref(doc_ref: &str) -> Option<&str> {
    doc_ref
        .split_once('-')
        .filter(|(owner, _)| owner.starts_with("YBE"))
        .map(|(owner, _)| owner)
}

#[derive(Debug, Deserialize)]
pub struct AddShortlistRequest {
    pub member_ref: String,
}

/// POST /shortlists - shortlist a member
pub async fn add_shortlist(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<AddShortlistRequest>,
) -> AppResult<Json<ApiResponse<Shortlist>>> {
    if req.member_ref == user.member_ref {
        return Err(AppError::new(ErrorCode::CannotShortlistSelf, "you cannot shortlist yourself"));
    }

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let actor = require_member(&mut conn, &user.member_ref)?;
    require_member(&mut conn, &req.member_ref)?;

    let existing = shortlists::table
        .filter(shortlists::shortlisted_by.eq(&user.member_ref))
        .filter(shortlists::shortlisted_user.eq(&req.member_ref))
        .first::<Shortlist>(&mut conn)
        .optional()?;

    if let Some(edge) = existing {
        return Ok(Json(ApiResponse::ok(edge)));
    }

    let new_edge = NewShortlist {
        doc_ref: new_doc_ref(&user.member_ref),
        shortlisted_by: user.member_ref.clone(),
        shortlisted_user: req.member_ref.clone(),
    };

    let edge = diesel::insert_into(shortlists::table)
        .values(&new_edge)
        .get_result::<Shortlist>(&mut conn)?;

    let display_name = actor.display_name.as_deref().unwrap_or("Someone");
    publisher::publish_shortlist_added(
        &state.rabbitmq,
        &user.member_ref,
        &req.member_ref,
        display_name,
    )
    .await;

    Ok(Json(ApiResponse::ok(edge)))
}

#[derive(Debug, Deserialize)]
pub struct BulkShortlistRequest {
    pub member_refs: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct BulkShortlistResponse {
    pub added: usize,
}

/// POST /shortlists/bulk - shortlist several members at once
pub async fn add_shortlists_bulk(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<BulkShortlistRequest>,
) -> AppResult<Json<ApiResponse<BulkShortlistResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let existing: Vec<String> = shortlists::table
        .filter(shortlists::shortlisted_by.eq(&user.member_ref))
        .select(shortlists::shortlisted_user)
        .load::<String>(&mut conn)?;

    let new_edges: Vec<NewShortlist> = req
        .member_refs
        .iter()
        .filter(|r| **r != user.member_ref && !existing.contains(r))
        .map(|r| NewShortlist {
            doc_ref: new_doc_ref(&user.member_ref),
            shortlisted_by: user.member_ref.clone(),
            shortlisted_user: r.clone(),
        })
        .collect();

    let added = diesel::insert_into(shortlists::table)
        .values(&new_edges)
        .execute(&mut conn)?;

    Ok(Json(ApiResponse::ok(BulkShortlistResponse { added })))
}

#[derive(Debug, Serialize)]
pub struct RemoveShortlistResponse {
    pub removed: bool,
}

/// DELETE /shortlists/:member_ref
pub async fn remove_shortlist(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(member_ref): Path<String>,
) -> AppResult<Json<ApiResponse<RemoveShortlistResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let deleted = diesel::delete(
        shortlists::table
            .filter(shortlists::shortlisted_by.eq(&user.member_ref))
            .filter(shortlists::shortlisted_user.eq(&member_ref)),
    )
    .execute(&mut conn)?;

    if deleted == 0 {
        return Err(AppError::new(ErrorCode::ShortlistNotFound, "shortlist entry not found"));
    }

    Ok(Json(ApiResponse::ok(RemoveShortlistResponse { removed: true })))
}

/// GET /shortlists - my shortlist
pub async fn list_shortlists(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<MemberSnapshot>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let refs: Vec<String> = shortlists::table
        .filter(shortlists::shortlisted_by.eq(&user.member_ref))
        .order(shortlists::created_at.desc())
        .select(shortlists::shortlisted_user)
        .load::<String>(&mut conn)?;

    let snapshots = load_snapshots(&state, &mut conn, &refs).await?;
    Ok(Json(ApiResponse::ok(snapshots)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_ref_carries_owner() {
        let doc_ref = new_doc_ref("YBE00000042");
        assert!(doc_ref.starts_with("YBE00000042-"));
        assert_eq!(owner_from_doc_ref(&doc_ref), Some("YBE00000042"));
    }

    #[test]
    fn legacy_bare_ref_has_no_owner() {
        assert_eq!(owner_from_doc_ref("9f8e7d6c5b4a"), None);
        assert_eq!(owner_from_doc_ref("9f8e7d6c-5b4a"), None);
    }

    #[test]
    fn refs_are_unique_per_call() {
        assert_ne!(new_doc_ref("YBE00000001"), new_doc_ref("YBE00000001"));
    }
}
