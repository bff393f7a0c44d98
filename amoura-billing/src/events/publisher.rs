use amoura_shared::clients::rabbitmq::RabbitMQClient;
use amoura_shared::types::event::{payloads, routing_keys, Event};

pub async fn publish_subscription_activated(rabbitmq: &RabbitMQClient, member_ref: &str, plan: &str) {
    let event = Event::new(
        "amoura-billing",
        routing_keys::BILLING_SUBSCRIPTION_ACTIVATED,
        payloads::SubscriptionActivated {
            member_ref: member_ref.to_string(),
            plan: plan.to_string(),
        },
    )
    .with_member(member_ref);

    if let Err(e) = rabbitmq.publish(routing_keys::BILLING_SUBSCRIPTION_ACTIVATED, &event).await {
        tracing::error!(error = %e, "failed to publish subscription.activated event");
    }
}
