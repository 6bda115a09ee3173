//! Signed-proof authorization for sensitive routes.
//!
//! Every proof-gated handler calls [`authorize`] with the bare action name
//! it serves. The proof is checked before any database access; only then is
//! the signer resolved to a registered user.

use sealpost_core::error::CoreError;
use sealpost_core::proof::{open_signed, PUBLIC_KEY_LENGTH};
use sealpost_core::validation::{decode_base64, decode_hex_key, require, MAX_PROOF_LENGTH};
use sealpost_db::models::user::User;
use sealpost_db::repositories::UserRepo;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Bare action names a proof can authorize.
pub mod actions {
    pub const SEND_MESSAGE: &str = "sendMessage";
    pub const EDIT_MESSAGE: &str = "editMessage";
    pub const DELETE_MESSAGE: &str = "deleteMessage";
    pub const UPDATE_DISPLAY_NAME: &str = "updateDisplayName";
    pub const UPDATE_STATUS: &str = "updateStatus";
    pub const SYNC_SETTINGS: &str = "syncSettings";
    pub const RETRIEVE_SETTINGS: &str = "retrieveSettings";
}

/// Check `proof` for `action` and return the registered signer.
pub async fn authorize(
    state: &AppState,
    public_signing_key: Option<&str>,
    proof: Option<&str>,
    action: &str,
) -> AppResult<User> {
    let key_hex = require("publicSigningKey", public_signing_key)?;
    let proof = require("proof", proof)?;

    let key = decode_hex_key("publicSigningKey", key_hex, PUBLIC_KEY_LENGTH)?;
    let signed = decode_base64("proof", proof, MAX_PROOF_LENGTH)?;

    let signer = state.verifier.verify_now(&signed, &key, action)?;

    let user = UserRepo::find_by_public_signing_key(&state.pool, &signer.public_key_hex())
        .await?
        .ok_or_else(|| {
            tracing::warn!(action, "Proof from unregistered key");
            AppError::Core(CoreError::Unauthorized(
                "Unknown public signing key".to_string(),
            ))
        })?;

    tracing::debug!(user_id = %user.id, action, "Proof accepted");
    Ok(user)
}

/// Open a signed profile value (display name, status) with the user's key.
///
/// Returns the raw signed bytes together with the opened text.
pub fn open_signed_text(
    field: &str,
    encoded: &str,
    max_len: usize,
    user: &User,
) -> AppResult<(Vec<u8>, String)> {
    let signed = decode_base64(field, encoded, max_len)?;
    let key = decode_hex_key("publicSigningKey", &user.public_signing_key, PUBLIC_KEY_LENGTH)?;

    let opened = open_signed(&signed, &key).map_err(|reason| {
        tracing::debug!(field, reason = reason.code(), "Signed value rejected");
        CoreError::Validation(format!("Invalid signature for '{field}'"))
    })?;
    let text = std::str::from_utf8(opened)
        .map_err(|_| CoreError::Validation(format!("'{field}' is not valid UTF-8")))?
        .to_string();

    Ok((signed, text))
}
