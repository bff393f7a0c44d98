use axum::extract::{Multipart, State};
use axum::Json;
use diesel::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use amoura_shared::errors::{AppError, AppResult, ErrorCode};
use amoura_shared::types::auth::AuthUser;
use amoura_shared::types::ApiResponse;

use crate::models::Profile;
use crate::schema::profiles;
use crate::services::moderation;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct PhotoUploadResponse {
    pub photo_url: String,
    pub celebrity_flagged: bool,
}

pub async fn upload_photo(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> AppResult<Json<ApiResponse<PhotoUploadResponse>>> {
    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let profile = profiles::table
        .filter(profiles::member_ref.eq(&user.member_ref))
        .first::<Profile>(&mut conn)
        .map_err(|_| AppError::new(ErrorCode::ProfileNotFound, "profile not found"))?;

    // Read the file from multipart
    let field = multipart
        .next_field()
        .await
        .map_err(|e| AppError::new(ErrorCode::PhotoUploadFailed, format!("failed to read multipart: {e}")))?
        .ok_or_else(|| AppError::new(ErrorCode::PhotoUploadFailed, "no file provided"))?;

    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();

    let ext = match content_type.as_str() {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        _ => {
            return Err(AppError::new(
                ErrorCode::PhotoUploadFailed,
                "unsupported image format, accepted: jpeg, png, webp",
            ));
        }
    };

    let data = field
        .bytes()
        .await
        .map_err(|e| AppError::new(ErrorCode::PhotoUploadFailed, format!("failed to read file data: {e}")))?;

    // Upload to MinIO first; the screening function receives the stored URL
    let file_id = Uuid::now_v7();
    let key = format!("profiles/{}/{}.{}", profile.member_ref, file_id, ext);

    let photo_url = state
        .minio
        .upload(&key, data.to_vec(), &content_type)
        .await
        .map_err(|e| AppError::new(ErrorCode::PhotoUploadFailed, e))?;

    // Screening fails open: a moderation outage never blocks the upload
    let verdict = moderation::screen_photo(&state.http_client, &state.config.moderation_url, &photo_url).await;

    if !verdict.valid {
        let _ = state.minio.delete(&key).await;
        return Err(AppError::new(
            ErrorCode::PhotoRejected,
            "photo did not pass content screening",
        ));
    }

    // Append to the ordered photo list
    let mut photo_list = profile.photo_urls.as_array().cloned().unwrap_or_default();
    photo_list.push(serde_json::Value::String(photo_url.clone()));

    diesel::update(profiles::table.filter(profiles::id.eq(profile.id)))
        .set((
            profiles::photo_urls.eq(serde_json::Value::Array(photo_list)),
            profiles::celebrity_flagged.eq(profile.celebrity_flagged || verdict.is_celebrity),
            profiles::updated_at.eq(chrono::Utc::now()),
        ))
        .execute(&mut conn)?;

    if verdict.is_celebrity {
        tracing::warn!(
            member_ref = %profile.member_ref,
            photo_url = %photo_url,
            "photo flagged as celebrity likeness, queued for manual review"
        );
    }

    tracing::info!(
        member_ref = %profile.member_ref,
        photo_url = %photo_url,
        "profile photo uploaded"
    );

    Ok(Json(ApiResponse::ok(PhotoUploadResponse {
        photo_url,
        celebrity_flagged: verdict.is_celebrity,
    })))
}
