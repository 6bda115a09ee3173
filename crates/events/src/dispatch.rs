//! Turns committed message-log mutations into pushed events.
//!
//! Callers invoke these only after the mutation has committed, so a peer
//! never sees an event for a write that later rolled back.

use std::sync::Arc;

use sealpost_core::validation::encode_base64;
use sealpost_db::models::message::Message;
use serde_json::json;

use crate::event::{EventType, StreamEvent};
use crate::registry::ChannelRegistry;

/// Publishes message events to the conversation's open channels.
#[derive(Clone)]
pub struct NotificationDispatcher {
    registry: Arc<ChannelRegistry>,
}

impl NotificationDispatcher {
    pub fn new(registry: Arc<ChannelRegistry>) -> Self {
        Self { registry }
    }

    /// Announce a newly appended message. Returns the delivered count.
    pub async fn message_sent(&self, message: &Message) -> usize {
        let payload = json!({
            "messageId": message.id,
            "content": encode_base64(&message.content),
            "messageEncryptionSalt": message.message_encryption_salt,
            "sequenceNumber": message.sequence_number,
        });
        self.dispatch(EventType::SendMessage, &message.conversation_id, payload)
            .await
    }

    /// Announce new content for an existing message.
    pub async fn message_edited(&self, message: &Message) -> usize {
        let payload = json!({
            "messageId": message.id,
            "content": encode_base64(&message.content),
            "messageEncryptionSalt": message.message_encryption_salt,
        });
        self.dispatch(EventType::EditMessage, &message.conversation_id, payload)
            .await
    }

    /// Announce a removed message.
    pub async fn message_deleted(&self, message: &Message) -> usize {
        let payload = json!({ "messageId": message.id });
        self.dispatch(EventType::DeleteMessage, &message.conversation_id, payload)
            .await
    }

    async fn dispatch(
        &self,
        event_type: EventType,
        conversation_id: &str,
        payload: serde_json::Value,
    ) -> usize {
        let event = StreamEvent::new(event_type, conversation_id, payload);
        let delivered = self.registry.publish(conversation_id, &event).await;
        tracing::debug!(
            conversation_id,
            event_type = ?event_type,
            delivered,
            "Event dispatched"
        );
        delivered
    }
}
