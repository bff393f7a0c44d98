use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::types::ApiErrorResponse;

/// Application error codes following the pattern E{service}{sequence}
///
/// Ranges:
/// - E0xxx: Shared/infrastructure errors
/// - E1xxx: User errors
/// - E2xxx: Matching errors
/// - E3xxx: Messaging errors
/// - E4xxx: Notification errors
/// - E5xxx: Billing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Shared (E0xxx)
    InternalError,
    ValidationError,
    NotFound,
    Unauthorized,
    Forbidden,
    RateLimited,
    ServiceUnavailable,
    BadRequest,
    PayloadTooLarge,
    LoadFailed,

    // User (E1xxx)
    ProfileNotFound,
    ProfileHidden,
    MemberRefAllocationFailed,
    CannotLikeSelf,
    CannotShortlistSelf,
    CannotBlockSelf,
    FavoriteNotFound,
    ShortlistNotFound,
    PhotoUploadFailed,
    PhotoRejected,

    // Matching (E2xxx)
    CohortFetchFailed,
    CandidateFetchFailed,

    // Messaging (E3xxx)
    ConversationNotFound,
    NotConversationParticipant,
    MessageNotFound,
    EmptyMessage,
    MessageRejected,
    PartnerAccountDeleted,

    // Notification (E4xxx)
    NotificationNotFound,

    // Billing (E5xxx)
    PlanNotFound,
    CheckoutSessionNotFound,
    PaymentNotVerified,
    InvalidWebhookSignature,
}

impl ErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            // Shared
            Self::InternalError => "E0001",
            Self::ValidationError => "E0002",
            Self::NotFound => "E0003",
            Self::Unauthorized => "E0004",
            Self::Forbidden => "E0005",
            Self::RateLimited => "E0006",
            Self::ServiceUnavailable => "E0007",
            Self::BadRequest => "E0008",
            Self::PayloadTooLarge => "E0009",
            Self::LoadFailed => "E0010",

            // User
            Self::ProfileNotFound => "E1001",
            Self::ProfileHidden => "E1002",
            Self::MemberRefAllocationFailed => "E1003",
            Self::CannotLikeSelf => "E1004",
            Self::CannotShortlistSelf => "E1005",
            Self::CannotBlockSelf => "E1006",
            Self::FavoriteNotFound => "E1007",
            Self::ShortlistNotFound => "E1008",
            Self::PhotoUploadFailed => "E1009",
            Self::PhotoRejected => "E1010",

            // Matching
            Self::CohortFetchFailed => "E2001",
            Self::CandidateFetchFailed => "E2002",

            // Messaging
            Self::ConversationNotFound => "E3001",
            Self::NotConversationParticipant => "E3002",
            Self::MessageNotFound => "E3003",
            Self::EmptyMessage => "E3004",
            Self::MessageRejected => "E3005",
            Self::PartnerAccountDeleted => "E3006",

            // Notification
            Self::NotificationNotFound => "E4001",

            // Billing
            Self::PlanNotFound => "E5001",
            Self::CheckoutSessionNotFound => "E5002",
            Self::PaymentNotVerified => "E5003",
            Self::InvalidWebhookSignature => "E5004",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InternalError | Self::ServiceUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
            Self::LoadFailed | Self::CohortFetchFailed | Self::CandidateFetchFailed => {
                StatusCode::BAD_GATEWAY
            }
            Self::ValidationError | Self::BadRequest | Self::EmptyMessage
            | Self::PhotoUploadFailed | Self::PhotoRejected => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::NotFound | Self::ProfileNotFound | Self::FavoriteNotFound
            | Self::ShortlistNotFound | Self::ConversationNotFound | Self::MessageNotFound
            | Self::NotificationNotFound | Self::PlanNotFound
            | Self::CheckoutSessionNotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized | Self::InvalidWebhookSignature => StatusCode::UNAUTHORIZED,
            Self::Forbidden | Self::ProfileHidden | Self::NotConversationParticipant
            | Self::MessageRejected | Self::PartnerAccountDeleted
            | Self::CannotLikeSelf | Self::CannotShortlistSelf | Self::CannotBlockSelf => {
                StatusCode::FORBIDDEN
            }
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::MemberRefAllocationFailed => StatusCode::CONFLICT,
            Self::PaymentNotVerified => StatusCode::PAYMENT_REQUIRED,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Known {
        code: ErrorCode,
        message: String,
        details: Option<serde_json::Value>,
    },

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Known {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(code: ErrorCode, message: impl Into<String>, details: serde_json::Value) -> Self {
        Self::Known {
            code,
            message: message.into(),
            details: Some(details),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn load_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::LoadFailed, message)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            AppError::Known { code, message, details } => {
                let status = code.status_code();
                let mut resp = ApiErrorResponse::new(code.code(), message);
                if let Some(d) = details {
                    resp = resp.with_details(d.clone());
                }
                (status, resp)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorResponse::new("E0001", "internal server error"),
                )
            }
            AppError::Database(err) => {
                tracing::error!(error = %err, "database error");
                match err {
                    diesel::result::Error::NotFound => (
                        StatusCode::NOT_FOUND,
                        ApiErrorResponse::new("E0003", "resource not found"),
                    ),
                    _ => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ApiErrorResponse::new("E0001", "database error"),
                    ),
                }
            }
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ApiErrorResponse::new("E0002", msg),
            ),
        };

        (status, Json(error_response)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: &[ErrorCode] = &[
        ErrorCode::InternalError,
        ErrorCode::ValidationError,
        ErrorCode::NotFound,
        ErrorCode::Unauthorized,
        ErrorCode::Forbidden,
        ErrorCode::RateLimited,
        ErrorCode::ServiceUnavailable,
        ErrorCode::BadRequest,
        ErrorCode::PayloadTooLarge,
        ErrorCode::LoadFailed,
        ErrorCode::ProfileNotFound,
        ErrorCode::ProfileHidden,
        ErrorCode::MemberRefAllocationFailed,
        ErrorCode::CannotLikeSelf,
        ErrorCode::CannotShortlistSelf,
        ErrorCode::CannotBlockSelf,
        ErrorCode::FavoriteNotFound,
        ErrorCode::ShortlistNotFound,
        ErrorCode::PhotoUploadFailed,
        ErrorCode::PhotoRejected,
        ErrorCode::CohortFetchFailed,
        ErrorCode::CandidateFetchFailed,
        ErrorCode::ConversationNotFound,
        ErrorCode::NotConversationParticipant,
        ErrorCode::MessageNotFound,
        ErrorCode::EmptyMessage,
        ErrorCode::MessageRejected,
        ErrorCode::PartnerAccountDeleted,
        ErrorCode::NotificationNotFound,
        ErrorCode::PlanNotFound,
        ErrorCode::CheckoutSessionNotFound,
        ErrorCode::PaymentNotVerified,
        ErrorCode::InvalidWebhookSignature,
    ];

    #[test]
    fn codes_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for code in ALL {
            assert!(seen.insert(code.code()), "duplicate error code {}", code.code());
        }
    }

    #[test]
    fn payment_failures_are_402() {
        assert_eq!(ErrorCode::PaymentNotVerified.status_code(), StatusCode::PAYMENT_REQUIRED);
    }
}
