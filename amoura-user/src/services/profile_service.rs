use diesel::prelude::*;
use uuid::Uuid;

use amoura_shared::clients::db::DbPool;
use amoura_shared::errors::{AppError, AppResult};

use crate::models::{NewProfile, Profile};
use crate::schema::{blocks, favorites, profiles, shortlists};
use crate::services::member_ref;

/// Creates a profile for a newly registered user.
/// Called from the RabbitMQ subscriber when a `user.registered` event is
/// received. The member reference is allocated transactionally before the
/// insert; a failed insert leaves a gap in the sequence, which is fine.
pub fn create_profile(
    pool: &DbPool,
    credential_id: Uuid,
    email: &str,
    phone: Option<&str>,
) -> AppResult<Profile> {
    let member_ref = member_ref::allocate_member_ref(pool)?;

    let mut conn = pool.get().map_err(|e| AppError::internal(e.to_string()))?;

    let new_profile = NewProfile {
        credential_id,
        member_ref,
        email: email.to_string(),
        phone: phone.map(|p| p.to_string()),
        gender_preference: "Everyone".to_string(),
        photo_urls: serde_json::json!([]),
        passions: serde_json::json!([]),
        interests: serde_json::json!([]),
        plan: "free".to_string(),
    };

    let profile = diesel::insert_into(profiles::table)
        .values(&new_profile)
        .get_result::<Profile>(&mut conn)?;

    tracing::info!(
        member_ref = %profile.member_ref,
        credential_id = %credential_id,
        "profile created for new user"
    );

    Ok(profile)
}

/// Remove a member entirely: the profile row plus every edge that points at
/// them in either direction. Messaging and notifications learn about the
/// deletion from the `account.deleted` event; their rows survive so the
/// partner side can render the "account deleted" state.
pub fn delete_account(pool: &DbPool, member_ref: &str) -> AppResult<()> {
    let mut conn = pool.get().map_err(|e| AppError::internal(e.to_string()))?;

    conn.transaction::<_, diesel::result::Error, _>(|conn| {
        diesel::delete(
            favorites::table.filter(
                favorites::liked_by.eq(member_ref).or(favorites::liked_user.eq(member_ref)),
            ),
        )
        .execute(conn)?;

        diesel::delete(
            shortlists::table.filter(
                shortlists::shortlisted_by
                    .eq(member_ref)
                    .or(shortlists::shortlisted_user.eq(member_ref)),
            ),
        )
        .execute(conn)?;

        diesel::delete(
            blocks::table.filter(blocks::blocker.eq(member_ref).or(blocks::blocked.eq(member_ref))),
        )
        .execute(conn)?;

        diesel::delete(profiles::table.filter(profiles::member_ref.eq(member_ref)))
            .execute(conn)?;

        Ok(())
    })?;

    tracing::info!(member_ref = %member_ref, "account deleted");
    Ok(())
}

/// Apply an activated subscription plan to the profile.
pub fn apply_plan(pool: &DbPool, member_ref: &str, plan: &str) -> AppResult<()> {
    let mut conn = pool.get().map_err(|e| AppError::internal(e.to_string()))?;

    diesel::update(profiles::table.filter(profiles::member_ref.eq(member_ref)))
        .set((
            profiles::plan.eq(plan),
            profiles::updated_at.eq(chrono::Utc::now()),
        ))
        .execute(&mut conn)?;

    Ok(())
}
