use std::sync::Arc;

use serde::Serialize;
use socketioxide::extract::SocketRef;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone)]
struct SocketMember(String);

fn get_member_ref(socket: &SocketRef) -> Option<String> {
    socket.extensions.get::<SocketMember>().map(|m| m.0.clone())
}

pub async fn on_connect_with_state(socket: SocketRef, state: Arc<AppState>) {
    let member_ref = match authenticate_socket(&socket, &state) {
        Ok(member_ref) => member_ref,
        Err(msg) => {
            tracing::warn!(error = %msg, "messaging socket auth failed");
            let _ = socket.emit(
                "error",
                &ErrorPayload {
                    code: "AUTH_FAILED".into(),
                    message: msg,
                },
            );
            socket.disconnect().ok();
            return;
        }
    };

    socket.extensions.insert(SocketMember(member_ref.clone()));

    // Join the member room so REST handlers can push into it
    let room = format!("user:{member_ref}");
    socket.join(room).ok();

    tracing::info!(member_ref = %member_ref, sid = %socket.id, "messaging socket connected");

    // Presence: Redis key now, user-service row in the background
    let _ = state.redis.set(&format!("online:{member_ref}"), "1", 120).await;

    let presence_state = state.clone();
    let mref = member_ref.clone();
    tokio::spawn(async move {
        update_presence(&presence_state, &mref, true).await;
    });

    let _ = socket.emit("connected", &serde_json::json!({ "member_ref": member_ref }));

    socket.on_disconnect({
        let state = state.clone();
        move |socket: SocketRef| {
            let state = state.clone();
            async move {
                on_disconnect_with_state(socket, state).await;
            }
        }
    });
}

async fn on_disconnect_with_state(socket: SocketRef, state: Arc<AppState>) {
    let Some(member_ref) = get_member_ref(&socket) else {
        return;
    };

    tracing::info!(member_ref = %member_ref, sid = %socket.id, "messaging socket disconnected");

    let _ = state.redis.del(&format!("online:{member_ref}")).await;
    update_presence(&state, &member_ref, false).await;
}

async fn update_presence(state: &AppState, member_ref: &str, online: bool) {
    let url = format!("{}/internal/presence", state.config.user_service_url);
    let result = state
        .http_client
        .post(&url)
        .json(&serde_json::json!({ "member_ref": member_ref, "online": online }))
        .send()
        .await;

    if let Err(e) = result {
        tracing::warn!(error = %e, member_ref = %member_ref, "failed to update presence");
    }
}

fn authenticate_socket(socket: &SocketRef, state: &Arc<AppState>) -> Result<String, String> {
    let connect_info = socket.req_parts();

    // Extract token from query string ?token=xxx
    let query = connect_info.uri.query().unwrap_or_default();
    let token = query
        .split('&')
        .find_map(|pair| {
            let mut split = pair.splitn(2, '=');
            let key = split.next()?;
            let value = split.next()?;
            if key == "token" {
                Some(value.to_string())
            } else {
                None
            }
        })
        .ok_or_else(|| "missing token query parameter".to_string())?;

    let mut validation = jsonwebtoken::Validation::new(jsonwebtoken::Algorithm::HS256);
    validation.validate_exp = true;

    let token_data = jsonwebtoken::decode::<amoura_shared::types::auth::Claims>(
        &token,
        &jsonwebtoken::DecodingKey::from_secret(state.config.jwt_secret.as_bytes()),
        &validation,
    )
    .map_err(|e| format!("invalid token: {e}"))?;

    if token_data.claims.is_expired() {
        return Err("token has expired".into());
    }

    Ok(token_data.claims.mref)
}
