use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// RabbitMQ Event envelope wrapping all domain events.
///
/// Routing key format: `amoura.{domain}.{entity}.{action}`
/// Example: `amoura.user.favorite.added`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event<T: Serialize> {
    pub id: Uuid,
    pub source: String,
    pub event_type: String,
    pub timestamp: DateTime<Utc>,
    pub correlation_id: Option<Uuid>,
    pub member_ref: Option<String>,
    pub data: T,
}

impl<T: Serialize> Event<T> {
    pub fn new(source: impl Into<String>, event_type: impl Into<String>, data: T) -> Self {
        Self {
            id: Uuid::now_v7(),
            source: source.into(),
            event_type: event_type.into(),
            timestamp: Utc::now(),
            correlation_id: None,
            member_ref: None,
            data,
        }
    }

    pub fn with_member(mut self, member_ref: impl Into<String>) -> Self {
        self.member_ref = Some(member_ref.into());
        self
    }

    pub fn with_correlation(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }
}

/// RabbitMQ routing keys
pub mod routing_keys {
    // Auth events (published by the external auth provider bridge)
    pub const AUTH_USER_REGISTERED: &str = "amoura.auth.user.registered";

    // User events
    pub const USER_PROFILE_UPDATED: &str = "amoura.user.profile.updated";
    pub const USER_ACCOUNT_DELETED: &str = "amoura.user.account.deleted";
    pub const USER_FAVORITE_ADDED: &str = "amoura.user.favorite.added";
    pub const USER_FAVORITE_REMOVED: &str = "amoura.user.favorite.removed";
    pub const USER_SHORTLIST_ADDED: &str = "amoura.user.shortlist.added";
    pub const USER_BLOCK_CHANGED: &str = "amoura.user.block.changed";

    // Messaging events
    pub const MESSAGING_MESSAGE_SENT: &str = "amoura.messaging.message.sent";

    // Billing events
    pub const BILLING_SUBSCRIPTION_ACTIVATED: &str = "amoura.billing.subscription.activated";
}

/// Common event data payloads
pub mod payloads {
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct UserRegistered {
        pub credential_id: Uuid,
        pub email: String,
        pub phone: Option<String>,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct ProfileUpdated {
        pub member_ref: String,
        pub display_name: Option<String>,
        pub photo_url: Option<String>,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct AccountDeleted {
        pub member_ref: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct FavoriteAdded {
        pub liked_by: String,
        pub liked_user: String,
        pub liker_display_name: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct FavoriteRemoved {
        pub liked_by: String,
        pub liked_user: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct ShortlistAdded {
        pub shortlisted_by: String,
        pub shortlisted_user: String,
        pub actor_display_name: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct BlockChanged {
        pub blocker: String,
        pub blocked: String,
        pub blocked_now: bool,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct MessageSent {
        pub message_id: Uuid,
        pub conversation_id: Uuid,
        pub sender_ref: String,
        pub recipient_ref: String,
        pub sender_display_name: String,
        pub message_type: String,
        pub content_preview: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct SubscriptionActivated {
        pub member_ref: String,
        pub plan: String,
    }
}
