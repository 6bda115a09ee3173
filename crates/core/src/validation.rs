//! Request field shape checks.
//!
//! Every helper names the offending field in its [`CoreError::Validation`]
//! message so the caller can fix the request.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::CoreError;

/// Byte length of ids, combined ids, secret ids and public keys.
pub const ID_BYTES: usize = 32;

/// Byte length of message encryption salts and settings nonces.
pub const SALT_BYTES: usize = 24;

/// Maximum base64 length of a message body.
pub const MAX_CONTENT_BASE64_LENGTH: usize = 5_000;

/// Maximum base64 length of a proof.
pub const MAX_PROOF_LENGTH: usize = 10_000;

/// Maximum base64 length of a synced settings blob.
pub const MAX_SETTINGS_BASE64_LENGTH: usize = 10_000;

/// Maximum base64 length of a signed profile value (display name, status).
pub const MAX_SIGNED_VALUE_LENGTH: usize = 10_000;

/// Maximum base64 length of an opaque contact user id.
pub const MAX_CONTACT_USER_ID_LENGTH: usize = 10_000;

/// Display names must be between these lengths (characters), inclusive.
pub const MIN_DISPLAY_NAME_LENGTH: usize = 3;
pub const MAX_DISPLAY_NAME_LENGTH: usize = 40;

/// Maximum length (characters) of an opened status.
pub const MAX_STATUS_LENGTH: usize = 200;

/// Largest page a message listing may request.
pub const MAX_LIST_COUNT: i64 = 100;

/// Unwrap a required field, failing with `Missing '<field>'`.
pub fn require<'a>(field: &str, value: Option<&'a str>) -> Result<&'a str, CoreError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(CoreError::Validation(format!("Missing '{field}'"))),
    }
}

/// Check that `value` is lowercase hex encoding exactly `byte_len` bytes.
pub fn validate_hex_key(field: &str, value: &str, byte_len: usize) -> Result<(), CoreError> {
    let well_formed = value.len() == byte_len * 2
        && value
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
    if well_formed {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid format for '{field}' (expected {} lowercase hex characters)",
            byte_len * 2
        )))
    }
}

/// Validate and decode a lowercase hex key of `byte_len` bytes.
pub fn decode_hex_key(field: &str, value: &str, byte_len: usize) -> Result<Vec<u8>, CoreError> {
    validate_hex_key(field, value, byte_len)?;
    hex::decode(value).map_err(|_| CoreError::Validation(format!("Invalid format for '{field}'")))
}

/// Decode a standard-alphabet base64 field no longer than `max_len` characters.
pub fn decode_base64(field: &str, value: &str, max_len: usize) -> Result<Vec<u8>, CoreError> {
    if value.len() > max_len {
        return Err(CoreError::Validation(format!(
            "'{field}' too long (max {max_len} characters)"
        )));
    }
    STANDARD
        .decode(value)
        .map_err(|_| CoreError::Validation(format!("Invalid format for '{field}'")))
}

/// Encode bytes as standard base64.
pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}
