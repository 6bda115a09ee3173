//! Handlers for the per-conversation message log.
//!
//! Mutations are proof-gated. Each one commits first and only then hands
//! the stored row to the dispatcher, so subscribers never see an event for
//! a write that did not happen.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use sealpost_core::error::CoreError;
use sealpost_core::types::SequenceNumber;
use sealpost_core::validation::{
    decode_base64, encode_base64, require, validate_hex_key, ID_BYTES, MAX_CONTENT_BASE64_LENGTH,
    MAX_LIST_COUNT, SALT_BYTES,
};
use sealpost_db::models::message::{Message, NewMessage};
use sealpost_db::repositories::MessageRepo;
use serde::{Deserialize, Serialize};

use crate::auth::{actions, authorize};
use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppQuery};
use crate::query::ListMessagesParams;
use crate::response::{Ack, DataResponse};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub conversation_id: Option<String>,
    pub message_id: Option<String>,
    pub combined_id: Option<String>,
    pub content: Option<String>,
    pub message_encryption_salt: Option<String>,
    pub public_signing_key: Option<String>,
    pub proof: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditMessageRequest {
    pub combined_id: Option<String>,
    pub content: Option<String>,
    pub message_encryption_salt: Option<String>,
    pub public_signing_key: Option<String>,
    pub proof: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteMessageRequest {
    pub combined_id: Option<String>,
    pub public_signing_key: Option<String>,
    pub proof: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SentMessage {
    pub message_id: String,
    pub sequence_number: SequenceNumber,
}

/// A message as returned by listings. Content is base64.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    pub message_id: String,
    pub conversation_id: String,
    pub content: String,
    pub message_encryption_salt: String,
    pub sequence_number: SequenceNumber,
}

impl From<Message> for MessageView {
    fn from(m: Message) -> Self {
        Self {
            content: encode_base64(&m.content),
            message_id: m.id,
            conversation_id: m.conversation_id,
            message_encryption_salt: m.message_encryption_salt,
            sequence_number: m.sequence_number,
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/messages
///
/// Append a message and announce it with its allocated sequence number.
pub async fn send_message(
    State(state): State<AppState>,
    AppJson(input): AppJson<SendMessageRequest>,
) -> AppResult<impl IntoResponse> {
    let conversation_id = require("conversationId", input.conversation_id.as_deref())?;
    let message_id = require("messageId", input.message_id.as_deref())?;
    let combined_id = require("combinedId", input.combined_id.as_deref())?;
    let content = require("content", input.content.as_deref())?;
    let salt = require("messageEncryptionSalt", input.message_encryption_salt.as_deref())?;

    validate_hex_key("conversationId", conversation_id, ID_BYTES)?;
    validate_hex_key("messageId", message_id, ID_BYTES)?;
    validate_hex_key("combinedId", combined_id, ID_BYTES)?;
    validate_hex_key("messageEncryptionSalt", salt, SALT_BYTES)?;
    let content = decode_base64("content", content, MAX_CONTENT_BASE64_LENGTH)?;

    authorize(
        &state,
        input.public_signing_key.as_deref(),
        input.proof.as_deref(),
        actions::SEND_MESSAGE,
    )
    .await?;

    let new_message = NewMessage {
        id: message_id.to_string(),
        conversation_id: conversation_id.to_string(),
        combined_id: combined_id.to_string(),
        content,
        message_encryption_salt: salt.to_string(),
    };
    let message = MessageRepo::append(&state.pool, &new_message)
        .await
        .map_err(|e| {
            if sealpost_db::is_unique_violation(&e) {
                AppError::Core(CoreError::Conflict(
                    "Message id or combined id already in use".to_string(),
                ))
            } else {
                AppError::Database(e)
            }
        })?;

    let delivered = state.dispatcher.message_sent(&message).await;
    tracing::info!(
        conversation_id = %message.conversation_id,
        sequence_number = message.sequence_number,
        delivered,
        "Message sent"
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: SentMessage {
                message_id: message.id,
                sequence_number: message.sequence_number,
            },
        }),
    ))
}

/// PUT /api/v1/messages
///
/// Replace a message's ciphertext. The sequence number never changes.
pub async fn edit_message(
    State(state): State<AppState>,
    AppJson(input): AppJson<EditMessageRequest>,
) -> AppResult<impl IntoResponse> {
    let combined_id = require("combinedId", input.combined_id.as_deref())?;
    let content = require("content", input.content.as_deref())?;
    let salt = require("messageEncryptionSalt", input.message_encryption_salt.as_deref())?;

    validate_hex_key("combinedId", combined_id, ID_BYTES)?;
    validate_hex_key("messageEncryptionSalt", salt, SALT_BYTES)?;
    let content = decode_base64("content", content, MAX_CONTENT_BASE64_LENGTH)?;

    authorize(
        &state,
        input.public_signing_key.as_deref(),
        input.proof.as_deref(),
        actions::EDIT_MESSAGE,
    )
    .await?;

    let message = MessageRepo::edit(&state.pool, combined_id, &content, salt)
        .await?
        .ok_or_else(|| CoreError::NotFound {
            entity: "Message",
            id: combined_id.to_string(),
        })?;

    state.dispatcher.message_edited(&message).await;
    tracing::info!(conversation_id = %message.conversation_id, "Message edited");

    Ok(Json(Ack::ok()))
}

/// DELETE /api/v1/messages
///
/// Remove a message. Deleting an absent message succeeds.
pub async fn delete_message(
    State(state): State<AppState>,
    AppJson(input): AppJson<DeleteMessageRequest>,
) -> AppResult<impl IntoResponse> {
    let combined_id = require("combinedId", input.combined_id.as_deref())?;
    validate_hex_key("combinedId", combined_id, ID_BYTES)?;

    authorize(
        &state,
        input.public_signing_key.as_deref(),
        input.proof.as_deref(),
        actions::DELETE_MESSAGE,
    )
    .await?;

    match MessageRepo::remove(&state.pool, combined_id).await? {
        Some(message) => {
            state.dispatcher.message_deleted(&message).await;
            tracing::info!(conversation_id = %message.conversation_id, "Message deleted");
        }
        None => tracing::debug!(combined_id, "Delete of absent message ignored"),
    }

    Ok(Json(Ack::ok()))
}

/// GET /api/v1/messages?conversationId=&before=&count=
///
/// Page backwards from `before`; results are ascending by sequence number.
pub async fn list_messages(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<ListMessagesParams>,
) -> AppResult<impl IntoResponse> {
    let conversation_id = require("conversationId", params.conversation_id.as_deref())?;
    let before = require("before", params.before.as_deref())?;
    let count = require("count", params.count.as_deref())?;

    let before: SequenceNumber = before
        .parse()
        .map_err(|_| CoreError::Validation("'before' is not a valid number".to_string()))?;
    let count: i64 = count
        .parse()
        .map_err(|_| CoreError::Validation("'count' is not a valid number".to_string()))?;

    if !(1..=MAX_LIST_COUNT).contains(&count) {
        return Err(CoreError::Validation(format!(
            "'count' must be between 1 and {MAX_LIST_COUNT}"
        ))
        .into());
    }
    if before < 0 {
        return Err(CoreError::Validation("'before' must not be negative".to_string()).into());
    }
    validate_hex_key("conversationId", conversation_id, ID_BYTES)?;

    let messages = MessageRepo::list(&state.pool, conversation_id, before, count).await?;
    let data: Vec<MessageView> = messages.into_iter().map(MessageView::from).collect();

    Ok(Json(DataResponse { data }))
}
