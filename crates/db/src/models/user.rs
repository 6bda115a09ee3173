//! Registered key holders.

use sealpost_core::types::Timestamp;
use sqlx::FromRow;

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: String,
    pub public_signing_key: String,
    pub public_encryption_key: String,
    pub display_name: Option<String>,
    /// The display name exactly as the user signed it.
    pub signed_display_name: Option<Vec<u8>>,
    pub status: Option<String>,
    pub signed_status: Option<Vec<u8>>,
    pub profile_picture_url: Option<String>,
    /// Client-encrypted settings blob.
    pub settings: Option<Vec<u8>>,
    pub settings_nonce: Option<String>,
    pub created_at: Timestamp,
}

/// DTO for registering a key pair.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub id: String,
    pub public_signing_key: String,
    pub public_encryption_key: String,
}
