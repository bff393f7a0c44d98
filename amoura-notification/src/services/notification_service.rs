use diesel::prelude::*;
use uuid::Uuid;

use amoura_shared::clients::db::DbPool;
use amoura_shared::errors::{AppError, AppResult, ErrorCode};

use crate::models::{NewNotification, Notification};
use crate::schema::notifications;

/// Create a new notification and insert it into the database.
pub fn create_notification(
    pool: &DbPool,
    recipient_ref: &str,
    actor_ref: Option<&str>,
    kind: &str,
    title: &str,
    body: &str,
    data: Option<serde_json::Value>,
) -> AppResult<Notification> {
    let mut conn = pool.get().map_err(|e| {
        tracing::error!(error = %e, "failed to get db connection");
        AppError::internal("database connection error")
    })?;

    let new_notification = NewNotification {
        recipient_ref: recipient_ref.to_string(),
        actor_ref: actor_ref.map(|s| s.to_string()),
        kind: kind.to_string(),
        title: title.to_string(),
        body: body.to_string(),
        data,
    };

    let notification = diesel::insert_into(notifications::table)
        .values(&new_notification)
        .get_result::<Notification>(&mut conn)?;

    tracing::debug!(
        notification_id = %notification.id,
        recipient_ref = %recipient_ref,
        kind = %kind,
        "notification created"
    );

    Ok(notification)
}

/// List notifications for a member, newest first, with pagination.
///
/// If the ordered query fails (e.g. a missing index on a fresh deploy), it
/// is retried once without the ordering clause and sorted in memory; a
/// second failure surfaces as a load error.
pub fn list_notifications(
    pool: &DbPool,
    recipient_ref: &str,
    limit: i64,
    offset: i64,
) -> AppResult<(Vec<Notification>, i64)> {
    let mut conn = pool.get().map_err(|e| {
        tracing::error!(error = %e, "failed to get db connection");
        AppError::internal("database connection error")
    })?;

    let total: i64 = notifications::table
        .filter(notifications::recipient_ref.eq(recipient_ref))
        .count()
        .get_result(&mut conn)?;

    let ordered = notifications::table
        .filter(notifications::recipient_ref.eq(recipient_ref))
        .order(notifications::created_at.desc())
        .limit(limit)
        .offset(offset)
        .load::<Notification>(&mut conn);

    let items = match ordered {
        Ok(items) => items,
        Err(e) => {
            tracing::warn!(error = %e, "ordered notification query failed, retrying unordered");
            let mut all = notifications::table
                .filter(notifications::recipient_ref.eq(recipient_ref))
                .load::<Notification>(&mut conn)
                .map_err(|e| {
                    tracing::error!(error = %e, "notification fallback query failed");
                    AppError::new(ErrorCode::LoadFailed, "could not load notifications")
                })?;
            all.sort_by_key(|n| std::cmp::Reverse(n.created_at));
            all.into_iter()
                .skip(offset.max(0) as usize)
                .take(limit.max(0) as usize)
                .collect()
        }
    };

    Ok((items, total))
}

/// Count unread notifications. NULL and false both count as unread, so the
/// predicate is "distinct from true" rather than an equality.
pub fn count_unread(pool: &DbPool, recipient_ref: &str) -> AppResult<i64> {
    let mut conn = pool.get().map_err(|e| {
        tracing::error!(error = %e, "failed to get db connection");
        AppError::internal("database connection error")
    })?;

    let count: i64 = notifications::table
        .filter(notifications::recipient_ref.eq(recipient_ref))
        .filter(notifications::is_read.is_distinct_from(true))
        .count()
        .get_result(&mut conn)?;

    Ok(count)
}

/// Mark all unread notifications as read for a member.
pub fn mark_all_read(pool: &DbPool, recipient_ref: &str) -> AppResult<usize> {
    let mut conn = pool.get().map_err(|e| {
        tracing::error!(error = %e, "failed to get db connection");
        AppError::internal("database connection error")
    })?;

    let updated = diesel::update(
        notifications::table
            .filter(notifications::recipient_ref.eq(recipient_ref))
            .filter(notifications::is_read.is_distinct_from(true)),
    )
    .set(notifications::is_read.eq(true))
    .execute(&mut conn)?;

    Ok(updated)
}

/// Mark a single notification as read (only if it belongs to the member).
/// Idempotent: re-marking an already-read row succeeds.
pub fn mark_read(pool: &DbPool, notification_id: Uuid, recipient_ref: &str) -> AppResult<Notification> {
    let mut conn = pool.get().map_err(|e| {
        tracing::error!(error = %e, "failed to get db connection");
        AppError::internal("database connection error")
    })?;

    let notification = diesel::update(
        notifications::table
            .filter(notifications::id.eq(notification_id))
            .filter(notifications::recipient_ref.eq(recipient_ref)),
    )
    .set(notifications::is_read.eq(true))
    .get_result::<Notification>(&mut conn)
    .map_err(|e| match e {
        diesel::result::Error::NotFound => {
            AppError::new(ErrorCode::NotificationNotFound, "notification not found")
        }
        other => AppError::Database(other),
    })?;

    Ok(notification)
}

/// Drop every notification whose actor no longer exists; called when an
/// account is deleted.
pub fn remove_actor_notifications(pool: &DbPool, actor_ref: &str) -> AppResult<usize> {
    let mut conn = pool.get().map_err(|e| {
        tracing::error!(error = %e, "failed to get db connection");
        AppError::internal("database connection error")
    })?;

    let deleted = diesel::delete(
        notifications::table.filter(notifications::actor_ref.eq(actor_ref)),
    )
    .execute(&mut conn)?;

    Ok(deleted)
}
