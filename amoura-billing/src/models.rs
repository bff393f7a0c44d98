use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::schema::subscriptions;

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = subscriptions)]
pub struct Subscription {
    pub id: Uuid,
    pub member_ref: String,
    pub plan: String,
    pub status: String,
    pub checkout_session_id: String,
    pub created_at: DateTime<Utc>,
    pub activated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = subscriptions)]
pub struct NewSubscription {
    pub member_ref: String,
    pub plan: String,
    pub status: String,
    pub checkout_session_id: String,
}

/// The purchasable plans. Prices are in minor units (cents).
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Plan {
    pub id: &'static str,
    pub name: &'static str,
    pub price_cents: u32,
    pub period_days: u32,
}

pub const PLANS: &[Plan] = &[
    Plan { id: "gold-1m", name: "Gold · 1 month", price_cents: 2999, period_days: 30 },
    Plan { id: "gold-3m", name: "Gold · 3 months", price_cents: 6999, period_days: 90 },
    Plan { id: "gold-12m", name: "Gold · 12 months", price_cents: 19999, period_days: 365 },
];

pub fn find_plan(id: &str) -> Option<&'static Plan> {
    PLANS.iter().find(|p| p.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_plans_resolve() {
        assert_eq!(find_plan("gold-1m").unwrap().period_days, 30);
        assert!(find_plan("platinum-99m").is_none());
    }
}
