//! Wire envelope for pushed events.

use serde::{Deserialize, Serialize};

/// Kind of a pushed event. Serialized as `SEND_MESSAGE`, `PING`, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    SendMessage,
    EditMessage,
    DeleteMessage,
    Ping,
}

/// An event scoped to one conversation.
///
/// Serializes as `{ "type", "payload", "conversationId" }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamEvent {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub payload: serde_json::Value,
    pub conversation_id: String,
}

impl StreamEvent {
    pub fn new(
        event_type: EventType,
        conversation_id: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            event_type,
            payload,
            conversation_id: conversation_id.into(),
        }
    }

    /// Keep-alive probe sent to every surviving channel on each sweep.
    pub fn ping(conversation_id: impl Into<String>) -> Self {
        Self::new(
            EventType::Ping,
            conversation_id,
            serde_json::Value::Object(Default::default()),
        )
    }
}
