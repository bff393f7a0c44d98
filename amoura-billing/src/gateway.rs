//! Payment gateway client: session-based checkout with server-side
//! verification. Activation is fail-closed: nothing short of an explicit
//! `paid` status from the gateway's own API activates an entitlement, and
//! every failure mode reads as unverified.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use amoura_shared::errors::{AppError, AppResult, ErrorCode};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct SessionStatus {
    pub id: String,
    pub payment_status: String,
    #[serde(default)]
    pub metadata: SessionMetadata,
}

#[derive(Debug, Default, Deserialize)]
pub struct SessionMetadata {
    #[serde(default)]
    pub member_ref: String,
    #[serde(default)]
    pub plan: String,
}

impl SessionStatus {
    pub fn is_paid(&self) -> bool {
        self.payment_status == "paid"
    }
}

#[derive(Clone)]
pub struct GatewayClient {
    client: reqwest::Client,
    base_url: String,
    secret_key: String,
}

impl GatewayClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            secret_key: secret_key.into(),
        }
    }

    /// Create a checkout session for a plan purchase. The gateway hosts the
    /// payment page; we only hand out the redirect URL.
    pub async fn create_session(
        &self,
        member_ref: &str,
        plan_id: &str,
        amount_cents: u32,
        success_url: &str,
        cancel_url: &str,
    ) -> AppResult<CheckoutSession> {
        let resp = self
            .client
            .post(format!("{}/v1/checkout/sessions", self.base_url))
            .bearer_auth(&self.secret_key)
            .json(&serde_json::json!({
                "amount": amount_cents,
                "currency": "eur",
                "success_url": success_url,
                "cancel_url": cancel_url,
                "metadata": { "member_ref": member_ref, "plan": plan_id },
            }))
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "gateway unreachable");
                AppError::new(ErrorCode::ServiceUnavailable, "payment gateway unavailable")
            })?;

        if !resp.status().is_success() {
            tracing::error!(status = %resp.status(), "gateway rejected session creation");
            return Err(AppError::new(ErrorCode::ServiceUnavailable, "payment gateway rejected the request"));
        }

        resp.json::<CheckoutSession>().await.map_err(|e| {
            tracing::error!(error = %e, "unparseable gateway response");
            AppError::new(ErrorCode::ServiceUnavailable, "payment gateway returned an invalid response")
        })
    }

    /// Verify a session server-side. The redirect parameters a client
    /// carries are never trusted; only this lookup decides.
    pub async fn verify_session(&self, session_id: &str) -> AppResult<SessionStatus> {
        let resp = self
            .client
            .get(format!("{}/v1/checkout/sessions/{session_id}", self.base_url))
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, session_id = %session_id, "gateway verification unreachable");
                AppError::new(ErrorCode::PaymentNotVerified, "payment could not be verified")
            })?;

        if !resp.status().is_success() {
            tracing::warn!(status = %resp.status(), session_id = %session_id, "gateway verification failed");
            return Err(AppError::new(ErrorCode::PaymentNotVerified, "payment could not be verified"));
        }

        resp.json::<SessionStatus>().await.map_err(|e| {
            tracing::error!(error = %e, session_id = %session_id, "unparseable verification response");
            AppError::new(ErrorCode::PaymentNotVerified, "payment could not be verified")
        })
    }
}

/// Check a webhook body against its `X-Gateway-Signature` header
/// (hex-encoded HMAC-SHA256 of the raw body).
pub fn verify_webhook_signature(secret: &str, body: &[u8], signature_hex: &str) -> bool {
    let Ok(signature) = hex::decode(signature_hex.trim()) else {
        return false;
    };

    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(body);
    mac.verify_slice(&signature).is_ok()
}

/// Compute the hex signature for a body; used by tests and local tooling.
pub fn sign_webhook_body(secret: &str, body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac accepts any key length");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_roundtrip() {
        let body = br#"{"type":"checkout.session.completed","data":{"session_id":"cs_123"}}"#;
        let sig = sign_webhook_body("whsec_test", body);
        assert!(verify_webhook_signature("whsec_test", body, &sig));
    }

    #[test]
    fn wrong_secret_rejects() {
        let body = b"payload";
        let sig = sign_webhook_body("secret-a", body);
        assert!(!verify_webhook_signature("secret-b", body, &sig));
    }

    #[test]
    fn tampered_body_rejects() {
        let sig = sign_webhook_body("whsec_test", b"original");
        assert!(!verify_webhook_signature("whsec_test", b"tampered", &sig));
    }

    #[test]
    fn garbage_signature_rejects() {
        assert!(!verify_webhook_signature("whsec_test", b"body", "not-hex!"));
        assert!(!verify_webhook_signature("whsec_test", b"body", ""));
    }

    #[test]
    fn only_paid_status_counts() {
        let paid: SessionStatus = serde_json::from_value(serde_json::json!({
            "id": "cs_1", "payment_status": "paid",
            "metadata": { "member_ref": "YBE00000001", "plan": "gold-1m" }
        }))
        .unwrap();
        assert!(paid.is_paid());

        let unpaid: SessionStatus = serde_json::from_value(serde_json::json!({
            "id": "cs_2", "payment_status": "unpaid"
        }))
        .unwrap();
        assert!(!unpaid.is_paid());
    }
}
