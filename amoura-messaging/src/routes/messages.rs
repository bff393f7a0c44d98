use axum::extract::{Multipart, Path, Query, State};
use axum::Json;
use chrono::Utc;
use diesel::dsl::count_star;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use amoura_shared::errors::{AppError, AppResult, ErrorCode};
use amoura_shared::types::api::ApiResponse;
use amoura_shared::types::auth::AuthUser;
use amoura_shared::types::pagination::{Paginated, PaginationParams};

use crate::events::publisher;
use crate::models::{Conversation, Message, NewMessage};
use crate::routes::conversations::{clear_unread, fetch_flags, load_owned_conversation};
use crate::schema::{conversations, messages};
use crate::sync::{self, MessageKind};
use crate::AppState;

// --- Request/response DTOs ---

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub message_type: String,
    pub text: Option<String>,
    pub media_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UnreadCountResponse {
    pub total_unread: i64,
}

#[derive(Debug, Serialize)]
pub struct ReadResponse {
    pub cleared: usize,
}

// --- Handlers ---

/// GET /conversations/:id/messages - message history, oldest first
pub async fn list_messages(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<Uuid>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<ApiResponse<Paginated<Message>>>> {
    let mut conn = state.db.get().map_err(|e| AppError::Internal(e.into()))?;

    load_owned_conversation(&mut conn, conversation_id, &auth_user.member_ref)?;

    let total: i64 = messages::table
        .filter(messages::conversation_id.eq(conversation_id))
        .select(count_star())
        .first::<i64>(&mut conn)?;

    // Strictly ascending by send time
    let items: Vec<Message> = messages::table
        .filter(messages::conversation_id.eq(conversation_id))
        .order(messages::sent_at.asc())
        .offset(params.offset() as i64)
        .limit(params.limit() as i64)
        .load::<Message>(&mut conn)?;

    let paginated = Paginated::new(items, total as u64, &params);

    Ok(Json(ApiResponse::ok(paginated)))
}

/// POST /conversations/:id/messages - send a message
pub async fn send_message(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<Uuid>,
    Json(req): Json<SendMessageRequest>,
) -> AppResult<Json<ApiResponse<Message>>> {
    let kind = MessageKind::parse(&req.message_type)
        .ok_or_else(|| AppError::new(ErrorCode::ValidationError, "unknown message type"))?;

    match kind {
        MessageKind::Text => {
            if req.text.as_deref().map_or(true, |t| t.trim().is_empty()) {
                return Err(AppError::new(ErrorCode::EmptyMessage, "message text is empty"));
            }
        }
        _ => {
            if req.media_url.as_deref().map_or(true, |u| u.trim().is_empty()) {
                return Err(AppError::new(ErrorCode::EmptyMessage, "media message has no media"));
            }
        }
    }

    let mut conn = state.db.get().map_err(|e| AppError::Internal(e.into()))?;
    let conversation = load_owned_conversation(&mut conn, conversation_id, &auth_user.member_ref)?;

    deliver(
        &state,
        &mut conn,
        &conversation,
        &auth_user.member_ref,
        kind,
        req.text,
        req.media_url,
    )
    .await
    .map(|message| Json(ApiResponse::ok(message)))
}

/// Shared delivery path for text and media sends: guard, message insert,
/// conversation metadata update, socket push, event publish.
async fn deliver(
    state: &AppState,
    conn: &mut diesel::pg::PgConnection,
    conversation: &Conversation,
    sender: &str,
    kind: MessageKind,
    text: Option<String>,
    media_url: Option<String>,
) -> AppResult<Message> {
    let partner = sync::partner_of(&conversation.participant_a, &conversation.participant_b, sender)
        .ok_or_else(|| {
            AppError::new(ErrorCode::NotConversationParticipant, "sender is not a participant")
        })?
        .to_string();

    // The guard re-derives block/deletion state at send time
    let (flags, _snapshot) = fetch_flags(state, sender, &partner).await?;
    if flags.partner_account_deleted {
        return Err(AppError::new(
            ErrorCode::PartnerAccountDeleted,
            "this account no longer exists",
        ));
    }
    if !flags.can_send_message() {
        return Err(AppError::new(
            ErrorCode::MessageRejected,
            "messages cannot be sent in this conversation",
        ));
    }

    let new_message = NewMessage {
        conversation_id: conversation.id,
        sender_ref: sender.to_string(),
        message_type: kind.as_str().to_string(),
        text: text.clone(),
        media_url: media_url.clone(),
    };

    let message: Message = diesel::insert_into(messages::table)
        .values(&new_message)
        .get_result(conn)?;

    // Second write: denormalized conversation summary. Not atomic with the
    // insert; a failure here is surfaced without rolling the message back.
    let preview = sync::render_content(kind.as_str(), text.as_deref(), media_url.as_deref());
    let metadata_update = diesel::update(conversations::table.find(conversation.id))
        .set((
            conversations::last_message.eq(&preview),
            conversations::last_message_type.eq(kind.as_str()),
            conversations::last_message_sent_at.eq(message.sent_at),
            conversations::updated_at.eq(Utc::now()),
        ))
        .execute(conn);

    if let Err(e) = metadata_update {
        tracing::error!(
            error = %e,
            conversation_id = %conversation.id,
            message_id = %message.id,
            "message stored but conversation summary update failed"
        );
        return Err(AppError::load_failed("message could not be fully delivered"));
    }

    // Push to the partner's room; a closed socket is not an error
    let room = format!("user:{partner}");
    let _ = state.io.to(room).emit(
        "new_message",
        &serde_json::json!({
            "conversation_id": conversation.id,
            "message": message,
        }),
    );

    let sender_name = conversation.name_of(sender).unwrap_or(sender).to_string();
    publisher::publish_message_sent(
        &state.rabbitmq,
        message.id,
        conversation.id,
        sender,
        &partner,
        &sender_name,
        kind.as_str(),
        preview.as_deref().unwrap_or(""),
    )
    .await;

    tracing::info!(
        sender = %sender,
        conversation = %conversation.id,
        message_type = %kind.as_str(),
        "message sent"
    );

    Ok(message)
}

/// POST /conversations/:id/read - acknowledge the whole conversation,
/// called when the view mounts.
pub async fn mark_conversation_read(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ReadResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::Internal(e.into()))?;

    load_owned_conversation(&mut conn, conversation_id, &auth_user.member_ref)?;
    let cleared = clear_unread(&mut conn, conversation_id, &auth_user.member_ref)?;

    Ok(Json(ApiResponse::ok(ReadResponse { cleared })))
}

/// POST /messages/:id/read - mark one message read; the rest of the
/// viewer's unread in that conversation is cleared with it (whole reset,
/// not a decrement).
pub async fn mark_message_read(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(message_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ReadResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::Internal(e.into()))?;

    let message: Message = messages::table
        .find(message_id)
        .first::<Message>(&mut conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::MessageNotFound, "message not found"))?;

    load_owned_conversation(&mut conn, message.conversation_id, &auth_user.member_ref)?;

    if message.sender_ref == auth_user.member_ref {
        return Err(AppError::bad_request("cannot mark your own message as read"));
    }

    diesel::update(messages::table.find(message_id))
        .set(messages::is_read.eq(true))
        .execute(&mut conn)?;

    let cleared = clear_unread(&mut conn, message.conversation_id, &auth_user.member_ref)?;

    Ok(Json(ApiResponse::ok(ReadResponse { cleared: cleared + 1 })))
}

/// GET /unread-count - total unread messages across all conversations
pub async fn get_unread_count(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<UnreadCountResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::Internal(e.into()))?;
    let viewer = &auth_user.member_ref;

    let conv_ids: Vec<Uuid> = conversations::table
        .filter(
            conversations::participant_a
                .eq(viewer)
                .or(conversations::participant_b.eq(viewer)),
        )
        .select(conversations::id)
        .load::<Uuid>(&mut conn)?;

    if conv_ids.is_empty() {
        return Ok(Json(ApiResponse::ok(UnreadCountResponse { total_unread: 0 })));
    }

    let total_unread: i64 = messages::table
        .filter(messages::conversation_id.eq_any(&conv_ids))
        .filter(messages::sender_ref.ne(viewer))
        .filter(messages::is_read.eq(false))
        .select(count_star())
        .first::<i64>(&mut conn)?;

    Ok(Json(ApiResponse::ok(UnreadCountResponse { total_unread })))
}

/// POST /conversations/:id/media - upload an attachment and send it as a
/// message of the matching kind.
pub async fn send_media(
    auth_user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<Uuid>,
    mut multipart: Multipart,
) -> AppResult<Json<ApiResponse<Message>>> {
    let mut file_data: Option<(Vec<u8>, String)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::new(ErrorCode::ValidationError, format!("multipart error: {e}")))?
    {
        if field.name().unwrap_or("") == "file" {
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::new(ErrorCode::ValidationError, format!("failed to read file: {e}")))?;
            file_data = Some((data.to_vec(), content_type));
        }
    }

    let (data, content_type) = file_data
        .ok_or_else(|| AppError::new(ErrorCode::ValidationError, "no file provided"))?;

    let kind = MessageKind::from_content_type(&content_type).ok_or_else(|| {
        AppError::new(
            ErrorCode::ValidationError,
            "unsupported attachment type, accepted: image, audio, video",
        )
    })?;

    let ext = match content_type.as_str() {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        "audio/ogg" => "ogg",
        "audio/mpeg" => "mp3",
        "audio/mp4" | "audio/aac" => "m4a",
        "video/mp4" => "mp4",
        "video/quicktime" => "mov",
        "video/webm" => "webm",
        _ => "bin",
    };

    let mut conn = state.db.get().map_err(|e| AppError::Internal(e.into()))?;
    let conversation = load_owned_conversation(&mut conn, conversation_id, &auth_user.member_ref)?;

    let file_id = Uuid::now_v7();
    let key = format!("messages/{}/{}.{}", conversation_id, file_id, ext);

    let media_url = state
        .minio
        .upload(&key, data, &content_type)
        .await
        .map_err(|e| AppError::new(ErrorCode::ValidationError, e))?;

    deliver(
        &state,
        &mut conn,
        &conversation,
        &auth_user.member_ref,
        kind,
        None,
        Some(media_url),
    )
    .await
    .map(|message| Json(ApiResponse::ok(message)))
}
