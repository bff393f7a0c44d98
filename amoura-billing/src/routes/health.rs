use axum::extract::State;
use axum::Json;
use std::sync::Arc;

use amoura_shared::types::api::HealthResponse;

use crate::AppState;

pub async fn health_check(State(_state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy("amoura-billing", env!("CARGO_PKG_VERSION")))
}
