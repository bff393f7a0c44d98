use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use amoura_shared::errors::AppResult;
use amoura_shared::types::api::ApiResponse;
use amoura_shared::types::auth::AuthUser;
use amoura_shared::types::pagination::{Paginated, PaginationParams};
use amoura_shared::types::MemberSnapshot;

use crate::bucket::{self, Bucket};
use crate::models::Notification;
use crate::services::notification_service;
use crate::AppState;

/// A feed entry with the actor resolved and the display bucket attached.
#[derive(Debug, Serialize)]
pub struct NotificationView {
    pub id: Uuid,
    pub kind: String,
    pub title: String,
    pub body: String,
    pub actor_ref: Option<String>,
    pub actor_name: String,
    pub actor_photo: Option<String>,
    pub data: Option<serde_json::Value>,
    pub is_read: bool,
    pub bucket: Bucket,
    pub created_at: DateTime<Utc>,
}

const PLACEHOLDER_NAME: &str = "An Amoura member";

/// GET /notifications
/// The feed, newest first, actors resolved best-effort.
pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<ApiResponse<Paginated<NotificationView>>>> {
    let limit = params.limit() as i64;
    let offset = params.offset() as i64;

    let (items, total) = notification_service::list_notifications(
        &state.db,
        &auth_user.member_ref,
        limit,
        offset,
    )?;

    let snapshots = resolve_actors(&state, &items).await;
    let today = Local::now().date_naive();

    let views: Vec<NotificationView> = items
        .into_iter()
        .map(|n| {
            let snapshot = n.actor_ref.as_deref().and_then(|r| snapshots.get(r));
            let local_date = n.created_at.with_timezone(&Local).date_naive();
            NotificationView {
                id: n.id,
                actor_name: snapshot
                    .and_then(|s| s.display_name.clone())
                    .unwrap_or_else(|| PLACEHOLDER_NAME.to_string()),
                actor_photo: snapshot.and_then(|s| s.photo_url.clone()),
                actor_ref: n.actor_ref,
                kind: n.kind,
                title: n.title,
                body: n.body,
                data: n.data,
                is_read: n.is_read == Some(true),
                bucket: bucket::bucket_for(local_date, today),
                created_at: n.created_at,
            }
        })
        .collect();

    let paginated = Paginated::new(views, total as u64, &params);
    Ok(Json(ApiResponse::ok(paginated)))
}

/// Actor snapshots from the user service. Failures leave the placeholder
/// name/photo rather than failing the feed.
async fn resolve_actors(
    state: &AppState,
    items: &[Notification],
) -> HashMap<String, MemberSnapshot> {
    let mut actor_refs: Vec<String> = items
        .iter()
        .filter_map(|n| n.actor_ref.clone())
        .collect();
    actor_refs.sort();
    actor_refs.dedup();

    if actor_refs.is_empty() {
        return HashMap::new();
    }

    #[derive(Deserialize)]
    struct Envelope {
        data: Vec<MemberSnapshot>,
    }

    let url = format!("{}/internal/profiles/batch", state.config.user_service_url);
    let resp = state
        .http_client
        .post(&url)
        .json(&serde_json::json!({ "member_refs": actor_refs }))
        .send()
        .await;

    let snapshots = match resp {
        Ok(resp) => resp.json::<Envelope>().await.map(|e| e.data).unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %e, "failed to resolve notification actors");
            vec![]
        }
    };

    snapshots
        .into_iter()
        .map(|s| (s.member_ref.clone(), s))
        .collect()
}

/// GET /notifications/unread-count
pub async fn unread_count(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
) -> AppResult<Json<ApiResponse<UnreadCountResponse>>> {
    let count = notification_service::count_unread(&state.db, &auth_user.member_ref)?;

    Ok(Json(ApiResponse::ok(UnreadCountResponse { count })))
}

#[derive(Debug, serde::Serialize)]
pub struct UnreadCountResponse {
    pub count: i64,
}

/// POST /notifications/mark-all-read
pub async fn mark_all_read(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
) -> AppResult<Json<ApiResponse<MarkAllReadResponse>>> {
    let updated = notification_service::mark_all_read(&state.db, &auth_user.member_ref)?;

    Ok(Json(ApiResponse::ok(MarkAllReadResponse { updated })))
}

#[derive(Debug, serde::Serialize)]
pub struct MarkAllReadResponse {
    pub updated: usize,
}

/// POST /notifications/:id/read
/// Idempotent; clients call it on every tap before navigating to the actor.
pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Notification>>> {
    let notification = notification_service::mark_read(&state.db, id, &auth_user.member_ref)?;

    Ok(Json(ApiResponse::ok(notification)))
}
