use std::sync::Arc;

use futures_lite::StreamExt;
use lapin::options::BasicAckOptions;

use amoura_shared::types::event::{payloads, routing_keys, Event};

use crate::AppState;

/// Listen for account.deleted events: open conversation views learn that
/// the partner is gone without polling.
pub async fn listen_account_deleted(state: Arc<AppState>) -> anyhow::Result<()> {
    let mut consumer = state.rabbitmq.subscribe(
        "amoura-messaging.user.account.deleted",
        &[routing_keys::USER_ACCOUNT_DELETED],
    ).await?;

    tracing::info!("listening for account.deleted events");

    while let Some(delivery) = consumer.next().await {
        match delivery {
            Ok(delivery) => {
                match serde_json::from_slice::<Event<payloads::AccountDeleted>>(&delivery.data) {
                    Ok(event) => {
                        let member_ref = &event.data.member_ref;
                        tracing::info!(member_ref = %member_ref, "received account.deleted event");

                        // Broadcast to everyone; clients holding a conversation
                        // with this member flip their deleted flag.
                        let _ = state.io.emit(
                            "partner-account-deleted",
                            &serde_json::json!({ "member_ref": member_ref }),
                        );
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

/// Listen for block.changed events and push them to both sides so open
/// conversation views recompute their flags immediately.
pub async fn listen_block_changed(state: Arc<AppState>) -> anyhow::Result<()> {
    let mut consumer = state.rabbitmq.subscribe(
        "amoura-messaging.user.block.changed",
        &[routing_keys::USER_BLOCK_CHANGED],
    ).await?;

    tracing::info!("listening for block.changed events");

    while let Some(delivery) = consumer.next().await {
        match delivery {
            Ok(delivery) => {
                match serde_json::from_slice::<Event<payloads::BlockChanged>>(&delivery.data) {
                    Ok(event) => {
                        let data = &event.data;
                        tracing::info!(
                            blocker = %data.blocker,
                            blocked = %data.blocked,
                            blocked_now = data.blocked_now,
                            "received block.changed event"
                        );

                        let payload = serde_json::json!({
                            "blocker": data.blocker,
                            "blocked": data.blocked,
                            "blocked_now": data.blocked_now,
                        });
                        for member_ref in [&data.blocker, &data.blocked] {
                            let room = format!("user:{member_ref}");
                            let _ = state.io.to(room).emit("block-changed", &payload);
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "failed to deserialize block.changed event");
                    }
                }
                let _ = delivery.ack(BasicAckOptions::default()).await;
            }
            Err(e) => {
                tracing::error!(error = %e, "block.changed consumer error");
            }
        }
    }

    Ok(())
}

/// Listen for profile.updated events to refresh the denormalized name
/// snapshots on conversations.
pub async fn listen_profile_updated(state: Arc<AppState>) -> anyhow::Result<()> {
    use diesel::prelude::*;

    use crate::schema::conversations;

    let mut consumer = state.rabbitmq.subscribe(
        "amoura-messaging.user.profile.updated",
        &[routing_keys::USER_PROFILE_UPDATED],
    ).await?;

    tracing::info!("listening for profile.updated events");

    while let Some(delivery) = consumer.next().await {
        match delivery {
            Ok(delivery) => {
                match serde_json::from_slice::<Event<payloads::ProfileUpdated>>(&delivery.data) {
                    Ok(event) => {
                        let data = &event.data;
                        let result: anyhow::Result<()> = (|| {
                            let mut conn = state.db.get()?;
                            diesel::update(
                                conversations::table
                                    .filter(conversations::participant_a.eq(&data.member_ref)),
                            )
                            .set(conversations::participant_a_name.eq(&data.display_name))
                            .execute(&mut conn)?;

                            diesel::update(
                                conversations::table
                                    .filter(conversations::participant_b.eq(&data.member_ref)),
                            )
                            .set(conversations::participant_b_name.eq(&data.display_name))
                            .execute(&mut conn)?;

                            Ok(())
                        })();

                        if let Err(e) = result {
                            tracing::error!(
                                error = %e,
                                member_ref = %data.member_ref,
                                "failed to refresh conversation name snapshots"
                            );
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "failed to deserialize profile.updated event");
                    }
                }
                let _ = delivery.ack(BasicAckOptions::default()).await;
            }
            Err(e) => {
                tracing::error!(error = %e, "profile.updated consumer error");
            }
        }
    }

    Ok(())
}
