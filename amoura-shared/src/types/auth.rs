use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims issued by the auth provider.
///
/// `sub` is the provider's credential id; `mref` is the member reference
/// (`YBE` + 8 digits) allocated at signup. Everything outside the auth
/// boundary joins on `mref`, never on `sub`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub mref: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: Uuid,
}

impl Claims {
    pub fn new(credential_id: Uuid, member_ref: impl Into<String>, duration_secs: i64) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: credential_id,
            mref: member_ref.into(),
            iat: now,
            exp: now + duration_secs,
            jti: Uuid::now_v7(),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }
}

/// Authenticated caller, extracted from a validated bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub credential_id: Uuid,
    pub member_ref: String,
    pub token_id: Uuid,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            credential_id: claims.sub,
            member_ref: claims.mref,
            token_id: claims.jti,
        }
    }
}
