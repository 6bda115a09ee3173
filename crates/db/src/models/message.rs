//! Message log rows.

use sealpost_core::types::{SequenceNumber, Timestamp};
use sqlx::FromRow;

/// A row from the `messages` table.
#[derive(Debug, Clone, FromRow)]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    pub combined_id: String,
    /// Opaque ciphertext.
    pub content: Vec<u8>,
    pub message_encryption_salt: String,
    pub sequence_number: SequenceNumber,
    pub created_at: Timestamp,
}

/// DTO for appending a message. The sequence number is allocated by the log.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub id: String,
    pub conversation_id: String,
    pub combined_id: String,
    pub content: Vec<u8>,
    pub message_encryption_salt: String,
}
