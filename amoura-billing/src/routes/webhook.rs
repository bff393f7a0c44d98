use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;

use amoura_shared::errors::{AppError, AppResult, ErrorCode};
use amoura_shared::types::api::ApiResponse;

use crate::gateway;
use crate::routes::checkout;
use crate::AppState;

#[derive(Debug, Deserialize)]
struct WebhookEvent {
    #[serde(rename = "type")]
    event_type: String,
    data: WebhookData,
}

#[derive(Debug, Deserialize)]
struct WebhookData {
    session_id: String,
}

/// POST /webhook - gateway event delivery.
///
/// The signature gate authenticates the sender; the session is still
/// re-verified against the gateway API before anything activates, so a
/// leaked webhook secret alone cannot mint subscriptions.
pub async fn gateway_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let signature = headers
        .get("X-Gateway-Signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            AppError::new(ErrorCode::InvalidWebhookSignature, "missing webhook signature")
        })?;

    if !gateway::verify_webhook_signature(&state.config.gateway_webhook_secret, body.as_bytes(), signature) {
        tracing::warn!("webhook with a bad signature rejected");
        return Err(AppError::new(ErrorCode::InvalidWebhookSignature, "invalid webhook signature"));
    }

    let event: WebhookEvent = serde_json::from_str(&body)
        .map_err(|e| AppError::new(ErrorCode::ValidationError, format!("malformed webhook body: {e}")))?;

    match event.event_type.as_str() {
        "checkout.session.completed" => {
            let status = state.gateway.verify_session(&event.data.session_id).await?;
            if !status.is_paid() {
                tracing::warn!(
                    session_id = %event.data.session_id,
                    "completed-session webhook but the gateway says unpaid"
                );
                return Err(AppError::new(ErrorCode::PaymentNotVerified, "session is not paid"));
            }
            checkout::activate(&state, &event.data.session_id).await?;
        }
        other => {
            tracing::debug!(event_type = %other, "ignoring webhook event type");
        }
    }

    Ok(Json(ApiResponse::ok(serde_json::json!({ "received": true }))))
}
