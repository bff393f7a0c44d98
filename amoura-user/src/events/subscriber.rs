use std::sync::Arc;

use futures_lite::StreamExt;
use lapin::options::BasicAckOptions;

use amoura_shared::types::event::{payloads, routing_keys, Event};

use crate::services::profile_service;
use crate::AppState;

/// Listen for auth.user.registered events to create profiles.
/// The member reference is allocated here, transactionally, exactly once.
pub async fn listen_user_registered(state: Arc<AppState>) -> anyhow::Result<()> {
    let mut consumer = state.rabbitmq.subscribe(
        "amoura-user.auth.user.registered",
        &[routing_keys::AUTH_USER_REGISTERED],
    ).await?;

    tracing::info!("listening for auth.user.registered events");

    while let Some(delivery) = consumer.next().await {
        match delivery {
            Ok(delivery) => {
                match serde_json::from_slice::<Event<payloads::UserRegistered>>(&delivery.data) {
                    Ok(event) => {
                        let data = &event.data;
                        tracing::info!(
                            credential_id = %data.credential_id,
                            email = %data.email,
                            "received user.registered event"
                        );

                        match profile_service::create_profile(
                            &state.db,
                            data.credential_id,
                            &data.email,
                            data.phone.as_deref(),
                        ) {
                            Ok(profile) => {
                                tracing::info!(
                                    member_ref = %profile.member_ref,
                                    "profile created for new user"
                                );
                            }
                            Err(e) => {
                                tracing::error!(
                                    error = %e,
                                    credential_id = %data.credential_id,
                                    "failed to create profile"
                                );
                            }
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "failed to deserialize user.registered event");
                    }
                }
                let _ = delivery.ack(BasicAckOptions::default()).await;
            }
            Err(e) => {
                tracing::error!(error = %e, "consumer error");
            }
        }
    }

    Ok(())
}

/// Listen for billing.subscription.activated events to update the plan.
pub async fn listen_subscription_activated(state: Arc<AppState>) -> anyhow::Result<()> {
    let mut consumer = state.rabbitmq.subscribe(
        "amoura-user.billing.subscription.activated",
        &[routing_keys::BILLING_SUBSCRIPTION_ACTIVATED],
    ).await?;

    tracing::info!("listening for subscription.activated events");

    while let Some(delivery) = consumer.next().await {
        match delivery {
            Ok(delivery) => {
                match serde_json::from_slice::<Event<payloads::SubscriptionActivated>>(&delivery.data) {
                    Ok(event) => {
                        let data = &event.data;
                        tracing::info!(
                            member_ref = %data.member_ref,
                            plan = %data.plan,
                            "received subscription.activated event"
                        );

                        if let Err(e) = profile_service::apply_plan(&state.db, &data.member_ref, &data.plan) {
                            tracing::error!(error = %e, member_ref = %data.member_ref, "failed to apply plan");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "failed to deserialize subscription.activated event");
                    }
                }
                let _ = delivery.ack(BasicAckOptions::default()).await;
            }
            Err(e) => {
                tracing::error!(error = %e, "consumer error");
            }
        }
    }

    Ok(())
}
