use amoura_shared::clients::rabbitmq::RabbitMQClient;
use amoura_shared::types::event::{payloads, routing_keys, Event};

pub async fn publish_profile_updated(
    rabbitmq: &RabbitMQClient,
    member_ref: &str,
    display_name: Option<&str>,
    photo_url: Option<&str>,
) {
    let event = Event::new(
        "amoura-user",
        routing_keys::USER_PROFILE_UPDATED,
        payloads::ProfileUpdated {
            member_ref: member_ref.to_string(),
            display_name: display_name.map(|s| s.to_string()),
            photo_url: photo_url.map(|s| s.to_string()),
        },
    )
    .with_member(member_ref);

    if let Err(e) = rabbitmq.publish(routing_keys::USER_PROFILE_UPDATED, &event).await {
        tracing::error!(error = %e, "failed to publish profile.updated event");
    }
}

pub async fn publish_account_deleted(rabbitmq: &RabbitMQClient, member_ref: &str) {
    let event = Event::new(
        "amoura-user",
        routing_keys::USER_ACCOUNT_DELETED,
        payloads::AccountDeleted {
            member_ref: member_ref.to_string(),
        },
    )
    .with_member(member_ref);

    if let Err(e) = rabbitmq.publish(routing_keys::USER_ACCOUNT_DELETED, &event).await {
        tracing::error!(error = %e, "failed to publish account.deleted event");
    }
}

pub async fn publish_favorite_added(
    rabbitmq: &RabbitMQClient,
    liked_by: &str,
    liked_user: &str,
    liker_display_name: &str,
) {
    let event = Event::new(
        "amoura-user",
        routing_keys::USER_FAVORITE_ADDED,
        payloads::FavoriteAdded {
            liked_by: liked_by.to_string(),
            liked_user: liked_user.to_string(),
            liker_display_name: liker_display_name.to_string(),
        },
    )
    .with_member(liked_by);

    if let Err(e) = rabbitmq.publish(routing_keys::USER_FAVORITE_ADDED, &event).await {
        tracing::error!(error = %e, "failed to publish favorite.added event");
    }
}

pub async fn publish_favorite_removed(rabbitmq: &RabbitMQClient, liked_by: &str, liked_user: &str) {
    let event = Event::new(
        "amoura-user",
        routing_keys::USER_FAVORITE_REMOVED,
        payloads::FavoriteRemoved {
            liked_by: liked_by.to_string(),
            liked_user: liked_user.to_string(),
        },
    )
    .with_member(liked_by);

    if let Err(e) = rabbitmq.publish(routing_keys::USER_FAVORITE_REMOVED, &event).await {
        tracing::error!(error = %e, "failed to publish favorite.removed event");
    }
}

pub async fn publish_shortlist_added(
    rabbitmq: &RabbitMQClient,
    shortlisted_by: &str,
    shortlisted_user: &str,
    actor_display_name: &str,
) {
    let event = Event::new(
        "amoura-user",
        routing_keys::USER_SHORTLIST_ADDED,
        payloads::ShortlistAdded {
            shortlisted_by: shortlisted_by.to_string(),
            shortlisted_user: shortlisted_user.to_string(),
            actor_display_name: actor_display_name.to_string(),
        },
    )
    .with_member(shortlisted_by);

    if let Err(e) = rabbitmq.publish(routing_keys::USER_SHORTLIST_ADDED, &event).await {
        tracing::error!(error = %e, "failed to publish shortlist.added event");
    }
}

pub async fn publish_block_changed(
    rabbitmq: &RabbitMQClient,
    blocker: &str,
    blocked: &str,
    blocked_now: bool,
) {
    let event = Event::new(
        "amoura-user",
        routing_keys::USER_BLOCK_CHANGED,
        payloads::BlockChanged {
            blocker: blocker.to_string(),
            blocked: blocked.to_string(),
            blocked_now,
        },
    )
    .with_member(blocker);

    if let Err(e) = rabbitmq.publish(routing_keys::USER_BLOCK_CHANGED, &event).await {
        tracing::error!(error = %e, "failed to publish block.changed event");
    }
}
