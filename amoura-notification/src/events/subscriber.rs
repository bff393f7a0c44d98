use std::sync::Arc;

use futures_lite::StreamExt;
use lapin::options::BasicAckOptions;

use amoura_shared::types::event::{payloads, routing_keys, Event};

use crate::services::notification_service;
use crate::AppState;

/// Listen for favorite events (favorite.added).
pub async fn listen_favorite_events(state: Arc<AppState>) -> anyhow::Result<()> {
    let mut consumer = state.rabbitmq.subscribe(
        "amoura-notification.favorite.added",
        &[routing_keys::USER_FAVORITE_ADDED],
    ).await?;

    tracing::info!("listening for favorite events");

    while let Some(delivery) = consumer.next().await {
        match delivery {
            Ok(delivery) => {
                match serde_json::from_slice::<Event<payloads::FavoriteAdded>>(&delivery.data) {
                    Ok(event) => {
                        let data = &event.data;
                        tracing::info!(
                            liked_by = %data.liked_by,
                            liked_user = %data.liked_user,
                            "received favorite.added event"
                        );

                        if let Err(e) = notification_service::create_notification(
                            &state.db,
                            &data.liked_user,
                            Some(&data.liked_by),
                            "like_received",
                            "Someone likes you!",
                            &format!("{} likes you", data.liker_display_name),
                            Some(serde_json::json!({
                                "liked_by": data.liked_by,
                            })),
                        ) {
                            tracing::error!(error = %e, "failed to create like notification");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "failed to deserialize favorite.added event");
                    }
                }

                let _ = delivery.ack(BasicAckOptions::default()).await;
            }
            Err(e) => {
                tracing::error!(error = %e, "favorite consumer error");
            }
        }
    }

    Ok(())
}

/// Listen for shortlist events (shortlist.added).
pub async fn listen_shortlist_events(state: Arc<AppState>) -> anyhow::Result<()> {
    let mut consumer = state.rabbitmq.subscribe(
        "amoura-notification.shortlist.added",
        &[routing_keys::USER_SHORTLIST_ADDED],
    ).await?;

    tracing::info!("listening for shortlist events");

    while let Some(delivery) = consumer.next().await {
        match delivery {
            Ok(delivery) => {
                match serde_json::from_slice::<Event<payloads::ShortlistAdded>>(&delivery.data) {
                    Ok(event) => {
                        let data = &event.data;
                        tracing::info!(
                            shortlisted_by = %data.shortlisted_by,
                            shortlisted_user = %data.shortlisted_user,
                            "received shortlist.added event"
                        );

                        if let Err(e) = notification_service::create_notification(
                            &state.db,
                            &data.shortlisted_user,
                            Some(&data.shortlisted_by),
                            "shortlist_received",
                            "You were shortlisted",
                            &format!("{} added you to their shortlist", data.actor_display_name),
                            Some(serde_json::json!({
                                "shortlisted_by": data.shortlisted_by,
                            })),
                        ) {
                            tracing::error!(error = %e, "failed to create shortlist notification");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "failed to deserialize shortlist.added event");
                    }
                }

                let _ = delivery.ack(BasicAckOptions::default()).await;
            }
            Err(e) => {
                tracing::error!(error = %e, "shortlist consumer error");
            }
        }
    }

    Ok(())
}

/// Listen for message events (message.sent).
pub async fn listen_message_events(state: Arc<AppState>) -> anyhow::Result<()> {
    let mut consumer = state.rabbitmq.subscribe(
        "amoura-notification.message.sent",
        &[routing_keys::MESSAGING_MESSAGE_SENT],
    ).await?;

    tracing::info!("listening for message events");

    while let Some(delivery) = consumer.next().await {
        match delivery {
            Ok(delivery) => {
                match serde_json::from_slice::<Event<payloads::MessageSent>>(&delivery.data) {
                    Ok(event) => {
                        let data = &event.data;
                        tracing::info!(
                            sender_ref = %data.sender_ref,
                            conversation_id = %data.conversation_id,
                            "received message.sent event"
                        );

                        if let Err(e) = notification_service::create_notification(
                            &state.db,
                            &data.recipient_ref,
                            Some(&data.sender_ref),
                            "message_received",
                            "New message",
                            &format!("New message from {}", data.sender_display_name),
                            Some(serde_json::json!({
                                "conversation_id": data.conversation_id,
                                "message_id": data.message_id,
                                "sender_ref": data.sender_ref,
                                "content_preview": data.content_preview,
                            })),
                        ) {
                            tracing::error!(error = %e, "failed to create message notification");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "failed to deserialize message.sent event");
                    }
                }

                let _ = delivery.ack(BasicAckOptions::default()).await;
            }
            Err(e) => {
                tracing::error!(error = %e, "message consumer error");
            }
        }
    }

    Ok(())
}

/// Listen for account.deleted events and scrub the deleted member out of
/// everyone's feed.
pub async fn listen_account_deleted(state: Arc<AppState>) -> anyhow::Result<()> {
    let mut consumer = state.rabbitmq.subscribe(
        "amoura-notification.account.deleted",
        &[routing_keys::USER_ACCOUNT_DELETED],
    ).await?;

    tracing::info!("listening for account.deleted events");

    while let Some(delivery) = consumer.next().await {
        match delivery {
            Ok(delivery) => {
                match serde_json::from_slice::<Event<payloads::AccountDeleted>>(&delivery.data) {
                    Ok(event) => {
                        let member_ref = &event.data.member_ref;
                        match notification_service::remove_actor_notifications(&state.db, member_ref) {
                            Ok(removed) => {
                                tracing::info!(
                                    member_ref = %member_ref,
                                    removed = removed,
                                    "scrubbed notifications for deleted account"
                                );
                            }
                            Err(e) => {
                                tracing::error!(error = %e, "failed to scrub notifications");
                            }
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "failed to deserialize account.deleted event");
                    }
                }

                let _ = delivery.ack(BasicAckOptions::default()).await;
            }
            Err(e) => {
                tracing::error!(error = %e, "account.deleted consumer error");
            }
        }
    }

    Ok(())
}
