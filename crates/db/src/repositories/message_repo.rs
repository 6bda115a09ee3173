//! Repository for the `messages` table and its per-conversation sequence
//! allocator.

use sealpost_core::types::SequenceNumber;

use crate::models::message::{Message, NewMessage};
use crate::DbPool;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, conversation_id, combined_id, content, message_encryption_salt, \
                       sequence_number, created_at";

/// Append-only, per-conversation ordered message log.
pub struct MessageRepo;

impl MessageRepo {
    /// Append a message, allocating the next sequence number for its
    /// conversation.
    ///
    /// The counter bump and the insert share one transaction. The upsert
    /// takes the write lock on the conversation's counter row, so concurrent
    /// appends to one conversation commit in allocation order. A duplicate
    /// `id` (or `combined_id`) fails with a unique violation and rolls the
    /// counter back with it.
    pub async fn append(pool: &DbPool, input: &NewMessage) -> Result<Message, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let (sequence_number,): (SequenceNumber,) = sqlx::query_as(
            "INSERT INTO conversation_sequences (conversation_id, last_sequence)
             VALUES (?1, 1)
             ON CONFLICT (conversation_id) DO UPDATE SET last_sequence = last_sequence + 1
             RETURNING last_sequence",
        )
        .bind(&input.conversation_id)
        .fetch_one(&mut *tx)
        .await?;

        let query = format!(
            "INSERT INTO messages (id, conversation_id, combined_id, content, message_encryption_salt, sequence_number)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING {COLUMNS}"
        );
        let message = sqlx::query_as::<_, Message>(&query)
            .bind(&input.id)
            .bind(&input.conversation_id)
            .bind(&input.combined_id)
            .bind(&input.content)
            .bind(&input.message_encryption_salt)
            .bind(sequence_number)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::debug!(
            conversation_id = %message.conversation_id,
            sequence_number = message.sequence_number,
            "Message appended"
        );
        Ok(message)
    }

    /// Replace the ciphertext and salt of the message with `combined_id`.
    ///
    /// Returns `None` when no such message exists. The sequence number is
    /// never touched.
    pub async fn edit(
        pool: &DbPool,
        combined_id: &str,
        content: &[u8],
        message_encryption_salt: &str,
    ) -> Result<Option<Message>, sqlx::Error> {
        let query = format!(
            "UPDATE messages SET content = ?1, message_encryption_salt = ?2
             WHERE combined_id = ?3
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Message>(&query)
            .bind(content)
            .bind(message_encryption_salt)
            .bind(combined_id)
            .fetch_optional(pool)
            .await
    }

    /// Delete the message with `combined_id`, returning the removed row.
    ///
    /// Deleting an absent message is not an error; `None` is returned.
    pub async fn remove(pool: &DbPool, combined_id: &str) -> Result<Option<Message>, sqlx::Error> {
        let query = format!("DELETE FROM messages WHERE combined_id = ?1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Message>(&query)
            .bind(combined_id)
            .fetch_optional(pool)
            .await
    }

    /// List messages of a conversation with `sequence_number < before`,
    /// ascending, at most `limit` rows.
    pub async fn list(
        pool: &DbPool,
        conversation_id: &str,
        before: SequenceNumber,
        limit: i64,
    ) -> Result<Vec<Message>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM messages
             WHERE conversation_id = ?1 AND sequence_number < ?2
             ORDER BY sequence_number ASC
             LIMIT ?3"
        );
        sqlx::query_as::<_, Message>(&query)
            .bind(conversation_id)
            .bind(before)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Find a message by its primary id.
    pub async fn find_by_id(pool: &DbPool, id: &str) -> Result<Option<Message>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM messages WHERE id = ?1");
        sqlx::query_as::<_, Message>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Count the messages currently stored for a conversation.
    pub async fn count_in_conversation(
        pool: &DbPool,
        conversation_id: &str,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM messages WHERE conversation_id = ?1")
                .bind(conversation_id)
                .fetch_one(pool)
                .await?;
        Ok(count)
    }
}
