use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::schema::{conversations, messages};

// --- Conversation ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = conversations)]
pub struct Conversation {
    pub id: Uuid,
    pub participant_a: String,
    pub participant_b: String,
    pub participant_a_name: Option<String>,
    pub participant_b_name: Option<String>,
    pub last_message: Option<String>,
    pub last_message_type: Option<String>,
    pub last_message_sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn is_participant(&self, member_ref: &str) -> bool {
        self.participant_a == member_ref || self.participant_b == member_ref
    }

    pub fn name_of(&self, member_ref: &str) -> Option<&str> {
        if self.participant_a == member_ref {
            self.participant_a_name.as_deref()
        } else if self.participant_b == member_ref {
            self.participant_b_name.as_deref()
        } else {
            None
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = conversations)]
pub struct NewConversation {
    pub participant_a: String,
    pub participant_b: String,
    pub participant_a_name: Option<String>,
    pub participant_b_name: Option<String>,
}

// --- Message ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = messages)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_ref: String,
    pub message_type: String,
    pub text: Option<String>,
    pub media_url: Option<String>,
    pub is_read: bool,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = messages)]
pub struct NewMessage {
    pub conversation_id: Uuid,
    pub sender_ref: String,
    pub message_type: String,
    pub text: Option<String>,
    pub media_url: Option<String>,
}
