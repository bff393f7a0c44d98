use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::{blocks, favorites, profiles, shortlists};

// --- Profile ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = profiles)]
pub struct Profile {
    pub id: Uuid,
    pub credential_id: Uuid,
    pub member_ref: String,
    pub email: String,
    pub phone: Option<String>,
    pub display_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<String>,
    pub gender_preference: String,
    pub profile_discovery: bool,
    pub photo_urls: serde_json::Value,
    pub day_job: Option<String>,
    pub religion: Option<String>,
    pub degree: Option<String>,
    pub origin_country: Option<String>,
    pub settled_country: Option<String>,
    pub city: Option<String>,
    pub mother_tongue: Option<String>,
    pub star_sign: Option<String>,
    pub passions: serde_json::Value,
    pub interests: serde_json::Value,
    pub celebrity_flagged: bool,
    pub is_online: bool,
    pub plan: String,
    pub onboarding_complete: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// First entry of the ordered photo list, if any.
    pub fn primary_photo(&self) -> Option<String> {
        self.photo_urls
            .as_array()
            .and_then(|a| a.first())
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    }

    pub fn passions_list(&self) -> Vec<String> {
        json_string_list(&self.passions)
    }

    pub fn interests_list(&self) -> Vec<String> {
        json_string_list(&self.interests)
    }
}

pub fn json_string_list(value: &serde_json::Value) -> Vec<String> {
    value
        .as_array()
        .map(|a| {
            a.iter()
                .filter_map(|v| v.as_str())
                .map(|s| s.to_string())
                .collect()
        })
        .unwrap_or_default()
}

#[derive(Debug, Insertable)]
#[diesel(table_name = profiles)]
pub struct NewProfile {
    pub credential_id: Uuid,
    pub member_ref: String,
    pub email: String,
    pub phone: Option<String>,
    pub gender_preference: String,
    pub photo_urls: serde_json::Value,
    pub passions: serde_json::Value,
    pub interests: serde_json::Value,
    pub plan: String,
}

#[derive(Debug, AsChangeset, Deserialize, Default)]
#[diesel(table_name = profiles)]
pub struct UpdateProfile {
    pub display_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub gender: Option<String>,
    pub gender_preference: Option<String>,
    pub profile_discovery: Option<bool>,
    pub day_job: Option<String>,
    pub religion: Option<String>,
    pub degree: Option<String>,
    pub origin_country: Option<String>,
    pub settled_country: Option<String>,
    pub city: Option<String>,
    pub mother_tongue: Option<String>,
    pub star_sign: Option<String>,
    pub passions: Option<serde_json::Value>,
    pub interests: Option<serde_json::Value>,
}

// --- Favorite ---

#[derive(Debug, Queryable, Identifiable, Serialize)]
#[diesel(table_name = favorites)]
pub struct Favorite {
    pub id: Uuid,
    pub liked_by: String,
    pub liked_user: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = favorites)]
pub struct NewFavorite {
    pub liked_by: String,
    pub liked_user: String,
}

// --- Shortlist ---

#[derive(Debug, Queryable, Identifiable, Serialize)]
#[diesel(table_name = shortlists)]
pub struct Shortlist {
    pub id: Uuid,
    pub doc_ref: String,
    pub shortlisted_by: String,
    pub shortlisted_user: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = shortlists)]
pub struct NewShortlist {
    pub doc_ref: String,
    pub shortlisted_by: String,
    pub shortlisted_user: String,
}

// --- Block ---

#[derive(Debug, Queryable, Identifiable, Serialize)]
#[diesel(table_name = blocks)]
pub struct Block {
    pub id: Uuid,
    pub blocker: String,
    pub blocked: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = blocks)]
pub struct NewBlock {
    pub blocker: String,
    pub blocked: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_list_reads_array() {
        let v = serde_json::json!(["Hiking", "Cooking", 7, null]);
        assert_eq!(json_string_list(&v), vec!["Hiking", "Cooking"]);
    }

    #[test]
    fn string_list_tolerates_non_array() {
        assert!(json_string_list(&serde_json::json!(null)).is_empty());
        assert!(json_string_list(&serde_json::json!("oops")).is_empty());
    }
}
