use uuid::Uuid;

use amoura_shared::clients::rabbitmq::RabbitMQClient;
use amoura_shared::types::event::{payloads, routing_keys, Event};

#[allow(clippy::too_many_arguments)]
pub async fn publish_message_sent(
    rabbitmq: &RabbitMQClient,
    message_id: Uuid,
    conversation_id: Uuid,
    sender_ref: &str,
    recipient_ref: &str,
    sender_display_name: &str,
    message_type: &str,
    content_preview: &str,
) {
    let event = Event::new(
        "amoura-messaging",
        routing_keys::MESSAGING_MESSAGE_SENT,
        payloads::MessageSent {
            message_id,
            conversation_id,
            sender_ref: sender_ref.to_string(),
            recipient_ref: recipient_ref.to_string(),
            sender_display_name: sender_display_name.to_string(),
            message_type: message_type.to_string(),
            content_preview: content_preview.chars().take(100).collect(),
        },
    )
    .with_member(sender_ref);

    if let Err(e) = rabbitmq.publish(routing_keys::MESSAGING_MESSAGE_SENT, &event).await {
        tracing::error!(error = %e, "failed to publish message.sent event");
    }
}
