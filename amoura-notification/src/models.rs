use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::schema::notifications;

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = notifications)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_ref: String,
    pub actor_ref: Option<String>,
    pub kind: String,
    pub title: String,
    pub body: String,
    pub data: Option<serde_json::Value>,
    /// Tri-state on purpose: rows written before the flag existed carry
    /// NULL, and NULL counts as unread exactly like `false`.
    pub is_read: Option<bool>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn is_unread(&self) -> bool {
        self.is_read != Some(true)
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = notifications)]
pub struct NewNotification {
    pub recipient_ref: String,
    pub actor_ref: Option<String>,
    pub kind: String,
    pub title: String,
    pub body: String,
    pub data: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification(is_read: Option<bool>) -> Notification {
        Notification {
            id: Uuid::nil(),
            recipient_ref: "YBE00000001".into(),
            actor_ref: None,
            kind: "like_received".into(),
            title: "t".into(),
            body: "b".into(),
            data: None,
            is_read,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn null_and_false_count_as_unread() {
        assert!(notification(None).is_unread());
        assert!(notification(Some(false)).is_unread());
        assert!(!notification(Some(true)).is_unread());
    }
}
