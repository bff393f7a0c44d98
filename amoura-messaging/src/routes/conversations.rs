use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use diesel::dsl::count_star;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use amoura_shared::errors::{AppError, AppResult, ErrorCode};
use amoura_shared::types::api::ApiResponse;
use amoura_shared::types::auth::AuthUser;
use amoura_shared::types::MemberSnapshot;

use crate::models::{Conversation, NewConversation};
use crate::schema::{conversations, messages};
use crate::sync::{self, ConversationFlags};
use crate::AppState;

/// Client-side budget for the conversation-list load; past it an empty
/// result is returned instead of spinning.
const LIST_LOAD_BUDGET: Duration = Duration::from_secs(10);

// --- Response DTOs ---

#[derive(Debug, Serialize)]
pub struct ConversationPreview {
    pub id: Uuid,
    pub partner_ref: String,
    pub partner_name: Option<String>,
    pub partner_photo: Option<String>,
    pub partner_online: bool,
    pub last_message: Option<String>,
    pub last_message_type: Option<String>,
    pub last_message_sent_at: Option<DateTime<Utc>>,
    pub unread_count: i64,
}

#[derive(Debug, Serialize)]
pub struct ConversationDetail {
    pub id: Uuid,
    pub partner_ref: String,
    pub partner_name: Option<String>,
    pub partner_photo: Option<String>,
    pub partner_online: bool,
    #[serde(flatten)]
    pub flags: ConversationFlags,
    pub can_send_message: bool,
    pub disabled_reason: Option<&'static str>,
    pub created_at: DateTime<Utc>,
}

// --- Handlers ---

/// GET /conversations - the viewer's conversations, newest activity first,
/// with a rendered last-message preview and the derived unread count.
pub async fn list_conversations(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<ConversationPreview>>>> {
    let viewer = auth_user.member_ref.clone();

    let db = state.db.clone();
    let query_viewer = viewer.clone();
    let load = tokio::task::spawn_blocking(move || -> AppResult<Vec<(Conversation, i64)>> {
        let mut conn = db.get().map_err(|e| AppError::internal(e.to_string()))?;

        let convs: Vec<Conversation> = conversations::table
            .filter(
                conversations::participant_a
                    .eq(&query_viewer)
                    .or(conversations::participant_b.eq(&query_viewer)),
            )
            .load::<Conversation>(&mut conn)?;

        let mut rows = Vec::with_capacity(convs.len());
        for conv in convs {
            let unread: i64 = messages::table
                .filter(messages::conversation_id.eq(conv.id))
                .filter(messages::sender_ref.ne(&query_viewer))
                .filter(messages::is_read.eq(false))
                .select(count_star())
                .first::<i64>(&mut conn)?;
            rows.push((conv, unread));
        }
        Ok(rows)
    });

    let mut rows = match tokio::time::timeout(LIST_LOAD_BUDGET, load).await {
        Ok(Ok(result)) => result?,
        Ok(Err(join_err)) => {
            return Err(AppError::internal(format!("conversation load task failed: {join_err}")));
        }
        Err(_) => {
            tracing::warn!(member_ref = %viewer, "conversation list load exceeded its budget");
            return Ok(Json(ApiResponse::ok_with_message(
                vec![],
                "conversations are taking too long to load",
            )));
        }
    };

    // Most recent message first; conversations without one sort last
    rows.sort_by_key(|(conv, _)| std::cmp::Reverse(sync::list_sort_instant(conv.last_message_sent_at)));

    // Partner snapshots are best-effort; the denormalized name is the fallback
    let partner_refs: Vec<String> = rows
        .iter()
        .filter_map(|(conv, _)| {
            sync::partner_of(&conv.participant_a, &conv.participant_b, &viewer).map(|p| p.to_string())
        })
        .collect();
    let snapshots = fetch_snapshots(&state, &partner_refs).await;

    let previews = rows
        .into_iter()
        .filter_map(|(conv, unread)| {
            let partner = sync::partner_of(&conv.participant_a, &conv.participant_b, &viewer)?.to_string();
            let snapshot = snapshots.get(&partner);
            let fallback_name = conv.name_of(&partner).map(|s| s.to_string());
            Some(ConversationPreview {
                id: conv.id,
                partner_name: snapshot
                    .and_then(|s| s.display_name.clone())
                    .or(fallback_name),
                partner_photo: snapshot.and_then(|s| s.photo_url.clone()),
                partner_online: snapshot.map(|s| s.is_online).unwrap_or(false),
                // Already rendered at send time (captions for media kinds)
                last_message: conv.last_message,
                last_message_type: conv.last_message_type,
                last_message_sent_at: conv.last_message_sent_at,
                unread_count: unread,
                partner_ref: partner,
            })
        })
        .collect();

    Ok(Json(ApiResponse::ok(previews)))
}

#[derive(Debug, Deserialize)]
pub struct OpenConversationRequest {
    pub partner_ref: String,
}

/// POST /conversations/open - find or create the conversation with a partner
/// and clear the viewer's unread state, as happens when the view mounts.
pub async fn open_conversation(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<OpenConversationRequest>,
) -> AppResult<Json<ApiResponse<ConversationDetail>>> {
    if req.partner_ref == auth_user.member_ref {
        return Err(AppError::bad_request("cannot open a conversation with yourself"));
    }

    let mut conn = state.db.get().map_err(|e| AppError::Internal(e.into()))?;

    let existing: Option<Conversation> = conversations::table
        .filter(
            conversations::participant_a
                .eq(&auth_user.member_ref)
                .and(conversations::participant_b.eq(&req.partner_ref))
                .or(conversations::participant_a
                    .eq(&req.partner_ref)
                    .and(conversations::participant_b.eq(&auth_user.member_ref))),
        )
        .first::<Conversation>(&mut conn)
        .optional()?;

    let conversation = match existing {
        Some(conv) => conv,
        None => {
            let snapshots =
                fetch_snapshots(&state, &[auth_user.member_ref.clone(), req.partner_ref.clone()]).await;
            let (a, b) = sync::canonical_pair(&auth_user.member_ref, &req.partner_ref);
            let name_of = |member_ref: &str| {
                snapshots.get(member_ref).and_then(|s| s.display_name.clone())
            };
            let new_conv = NewConversation {
                participant_a: a.to_string(),
                participant_b: b.to_string(),
                participant_a_name: name_of(a),
                participant_b_name: name_of(b),
            };
            diesel::insert_into(conversations::table)
                .values(&new_conv)
                .get_result::<Conversation>(&mut conn)?
        }
    };

    // Opening the view acknowledges everything addressed to the viewer
    clear_unread(&mut conn, conversation.id, &auth_user.member_ref)?;

    let detail = build_detail(&state, &conversation, &auth_user.member_ref).await?;
    Ok(Json(ApiResponse::ok(detail)))
}

/// GET /conversations/:id - conversation detail with the derived flags
pub async fn get_conversation(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ConversationDetail>>> {
    let mut conn = state.db.get().map_err(|e| AppError::Internal(e.into()))?;

    let conversation = load_owned_conversation(&mut conn, conversation_id, &auth_user.member_ref)?;
    let detail = build_detail(&state, &conversation, &auth_user.member_ref).await?;

    Ok(Json(ApiResponse::ok(detail)))
}

// --- Helpers shared with the message routes ---

pub fn load_owned_conversation(
    conn: &mut diesel::pg::PgConnection,
    conversation_id: Uuid,
    viewer: &str,
) -> AppResult<Conversation> {
    let conversation: Conversation = conversations::table
        .find(conversation_id)
        .first::<Conversation>(conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::ConversationNotFound, "conversation not found"))?;

    if !conversation.is_participant(viewer) {
        return Err(AppError::new(
            ErrorCode::NotConversationParticipant,
            "you are not a participant of this conversation",
        ));
    }

    Ok(conversation)
}

/// Whole-state acknowledgment: every message addressed to the viewer in
/// this conversation becomes read in one set-wide update.
pub fn clear_unread(
    conn: &mut diesel::pg::PgConnection,
    conversation_id: Uuid,
    viewer: &str,
) -> AppResult<usize> {
    let updated = diesel::update(
        messages::table
            .filter(messages::conversation_id.eq(conversation_id))
            .filter(messages::sender_ref.ne(viewer))
            .filter(messages::is_read.eq(false)),
    )
    .set(messages::is_read.eq(true))
    .execute(conn)?;

    Ok(updated)
}

async fn build_detail(
    state: &AppState,
    conversation: &Conversation,
    viewer: &str,
) -> AppResult<ConversationDetail> {
    let partner = sync::partner_of(&conversation.participant_a, &conversation.participant_b, viewer)
        .ok_or_else(|| {
            AppError::new(ErrorCode::NotConversationParticipant, "viewer is not a participant")
        })?
        .to_string();

    let (flags, snapshot) = fetch_flags(state, viewer, &partner).await?;

    Ok(ConversationDetail {
        id: conversation.id,
        partner_name: snapshot
            .as_ref()
            .and_then(|s| s.display_name.clone())
            .or_else(|| conversation.name_of(&partner).map(|s| s.to_string())),
        // A deleted partner keeps no photo
        partner_photo: snapshot.as_ref().and_then(|s| s.photo_url.clone()),
        partner_online: snapshot.as_ref().map(|s| s.is_online).unwrap_or(false),
        can_send_message: flags.can_send_message(),
        disabled_reason: flags.disabled_reason(),
        flags,
        created_at: conversation.created_at,
        partner_ref: partner,
    })
}

#[derive(Debug, Deserialize)]
struct PairBlocks {
    a_blocks_b: bool,
    b_blocks_a: bool,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

/// Derive the conversation flags from the user service: the block edges in
/// both directions and whether the partner profile still resolves.
pub async fn fetch_flags(
    state: &AppState,
    viewer: &str,
    partner: &str,
) -> AppResult<(ConversationFlags, Option<MemberSnapshot>)> {
    let url = format!(
        "{}/internal/blocks/pair?a={viewer}&b={partner}",
        state.config.user_service_url
    );
    let blocks: PairBlocks = state
        .http_client
        .get(&url)
        .send()
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "failed to load block state");
            AppError::load_failed("could not determine conversation state")
        })?
        .json::<Envelope<PairBlocks>>()
        .await
        .map(|e| e.data)
        .map_err(|e| {
            tracing::error!(error = %e, "unparseable block state response");
            AppError::load_failed("could not determine conversation state")
        })?;

    let snapshots = fetch_snapshots(state, &[partner.to_string()]).await;
    let snapshot = snapshots.get(partner).cloned();

    let flags = ConversationFlags {
        viewer_blocked_partner: blocks.a_blocks_b,
        partner_blocked_viewer: blocks.b_blocks_a,
        partner_account_deleted: snapshot.is_none(),
    };

    Ok((flags, snapshot))
}

/// Batch partner snapshots from the user service. Best-effort: failures log
/// and return an empty map so list rendering falls back to the denormalized
/// name columns.
pub async fn fetch_snapshots(
    state: &AppState,
    member_refs: &[String],
) -> HashMap<String, MemberSnapshot> {
    if member_refs.is_empty() {
        return HashMap::new();
    }

    let url = format!("{}/internal/profiles/batch", state.config.user_service_url);
    let resp = state
        .http_client
        .post(&url)
        .json(&serde_json::json!({ "member_refs": member_refs }))
        .send()
        .await;

    let snapshots: Vec<MemberSnapshot> = match resp {
        Ok(resp) => resp
            .json::<Envelope<Vec<MemberSnapshot>>>()
            .await
            .map(|e| e.data)
            .unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %e, "failed to fetch member snapshots");
            vec![]
        }
    };

    snapshots
        .into_iter()
        .map(|s| (s.member_ref.clone(), s))
        .collect()
}
