//! Handlers for the opaque contact list.
//!
//! Contacts are filed under a client-derived `secretId`; the server never
//! learns whose list it is or who is on it.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use sealpost_core::error::CoreError;
use sealpost_core::validation::{
    decode_base64, decode_hex_key, encode_base64, require, validate_hex_key, ID_BYTES,
    MAX_CONTACT_USER_ID_LENGTH, SALT_BYTES,
};
use sealpost_db::models::contact::{Contact, CreateContact};
use sealpost_db::repositories::ContactRepo;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::extract::{AppJson, AppQuery};
use crate::query::SecretIdParams;
use crate::response::{Ack, DataResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRequest {
    /// `add` or `remove`.
    pub action: Option<String>,
    pub combined_id: Option<String>,
    pub secret_id: Option<String>,
    /// Encrypted user id, base64.
    pub user_id: Option<String>,
    /// Salt for `user_id`, 24-byte hex.
    pub user_id_salt: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactView {
    pub user_id: String,
    pub user_id_salt: String,
}

impl From<Contact> for ContactView {
    fn from(contact: Contact) -> Self {
        Self {
            user_id: encode_base64(&contact.user_id),
            user_id_salt: hex::encode(contact.user_id_salt),
        }
    }
}

/// POST /api/v1/contacts
///
/// `action: "add"` needs `secretId`, `userId` and `userIdSalt`;
/// `action: "remove"` needs only `combinedId`. Both are idempotent.
pub async fn update_contact(
    State(state): State<AppState>,
    AppJson(input): AppJson<ContactRequest>,
) -> AppResult<impl IntoResponse> {
    let action = require("action", input.action.as_deref())?;
    let combined_id = require("combinedId", input.combined_id.as_deref())?;

    match action {
        "add" => {
            let secret_id = require("secretId", input.secret_id.as_deref())?;
            let user_id = require("userId", input.user_id.as_deref())?;
            let user_id_salt = require("userIdSalt", input.user_id_salt.as_deref())?;

            validate_hex_key("combinedId", combined_id, ID_BYTES)?;
            validate_hex_key("secretId", secret_id, ID_BYTES)?;
            let user_id_salt = decode_hex_key("userIdSalt", user_id_salt, SALT_BYTES)?;
            let user_id = decode_base64("userId", user_id, MAX_CONTACT_USER_ID_LENGTH)?;

            let contact = CreateContact {
                id: hex::encode(rand::random::<[u8; 32]>()),
                combined_id: combined_id.to_string(),
                secret_id: secret_id.to_string(),
                user_id,
                user_id_salt,
            };
            let inserted = ContactRepo::add(&state.pool, &contact).await?;
            tracing::debug!(inserted, "Contact add");
        }
        "remove" => {
            validate_hex_key("combinedId", combined_id, ID_BYTES)?;
            let removed = ContactRepo::remove(&state.pool, combined_id).await?;
            tracing::debug!(removed, "Contact remove");
        }
        _ => {
            return Err(CoreError::Validation("Invalid value for 'action'".to_string()).into());
        }
    }

    Ok(Json(Ack::ok()))
}

/// GET /api/v1/contacts?secretId=
pub async fn list_contacts(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<SecretIdParams>,
) -> AppResult<impl IntoResponse> {
    let secret_id = require("secretId", params.secret_id.as_deref())?;
    validate_hex_key("secretId", secret_id, ID_BYTES)?;

    let contacts = ContactRepo::list_by_secret_id(&state.pool, secret_id).await?;
    let data: Vec<ContactView> = contacts.into_iter().map(ContactView::from).collect();

    Ok(Json(DataResponse { data }))
}
