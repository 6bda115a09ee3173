//! Handlers for key registration and user profiles.
//!
//! Display name and status arrive signed by the user; the server opens them
//! with the registered key, stores the opened text for lookup and keeps the
//! signed blob so peers can verify it themselves.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use sealpost_core::error::CoreError;
use sealpost_core::proof::PUBLIC_KEY_LENGTH;
use sealpost_core::validation::{
    decode_base64, encode_base64, require, validate_hex_key, MAX_DISPLAY_NAME_LENGTH,
    MAX_SETTINGS_BASE64_LENGTH, MAX_SIGNED_VALUE_LENGTH, MAX_STATUS_LENGTH,
    MIN_DISPLAY_NAME_LENGTH, SALT_BYTES,
};
use sealpost_db::models::user::{CreateUser, User};
use sealpost_db::repositories::UserRepo;
use serde::{Deserialize, Serialize};

use crate::auth::{actions, authorize, open_signed_text};
use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppQuery};
use crate::query::ProofParams;
use crate::response::{Ack, DataResponse};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterKeysRequest {
    pub public_signing_key: Option<String>,
    pub public_encryption_key: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDisplayNameRequest {
    pub public_signing_key: Option<String>,
    pub proof: Option<String>,
    /// Signed display name, base64.
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub public_signing_key: Option<String>,
    pub proof: Option<String>,
    /// Signed status, base64. Signing an empty string clears the status.
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSettingsRequest {
    pub public_signing_key: Option<String>,
    pub proof: Option<String>,
    pub settings: Option<String>,
    pub settings_nonce: Option<String>,
}

/// Public profile of a user.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub public_signing_key: String,
    pub public_encryption_key: String,
    pub signed_display_name: Option<String>,
    pub signed_status: Option<String>,
    pub profile_picture_url: Option<String>,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            public_signing_key: user.public_signing_key,
            public_encryption_key: user.public_encryption_key,
            signed_display_name: user.signed_display_name.as_deref().map(encode_base64),
            signed_status: user.signed_status.as_deref().map(encode_base64),
            profile_picture_url: user.profile_picture_url,
        }
    }
}

/// Encrypted settings blob as stored.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsView {
    pub settings: Option<String>,
    pub settings_nonce: Option<String>,
}

// ---------------------------------------------------------------------------
// Registration and lookup
// ---------------------------------------------------------------------------

/// POST /api/v1/users
///
/// Register a signing / encryption key pair. Fails with 409 if either key
/// is already registered.
pub async fn register_keys(
    State(state): State<AppState>,
    AppJson(input): AppJson<RegisterKeysRequest>,
) -> AppResult<impl IntoResponse> {
    let signing_key = require("publicSigningKey", input.public_signing_key.as_deref())?;
    let encryption_key = require("publicEncryptionKey", input.public_encryption_key.as_deref())?;
    validate_hex_key("publicSigningKey", signing_key, PUBLIC_KEY_LENGTH)?;
    validate_hex_key("publicEncryptionKey", encryption_key, PUBLIC_KEY_LENGTH)?;

    let keys_in_use = || CoreError::Conflict("One or more keys are already in use".to_string());

    if UserRepo::any_key_in_use(&state.pool, signing_key, encryption_key).await? {
        return Err(keys_in_use().into());
    }

    let create = CreateUser {
        id: hex::encode(rand::random::<[u8; 32]>()),
        public_signing_key: signing_key.to_string(),
        public_encryption_key: encryption_key.to_string(),
    };
    let user = UserRepo::create(&state.pool, &create).await.map_err(|e| {
        if sealpost_db::is_unique_violation(&e) {
            AppError::Core(keys_in_use())
        } else {
            AppError::Database(e)
        }
    })?;

    tracing::info!(user_id = %user.id, "Keys registered");

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: UserInfo::from(user),
        }),
    ))
}

/// GET /api/v1/users/{userId}
///
/// `userId` is either a public signing key (64 lowercase hex characters) or
/// a display name.
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let user = if validate_hex_key("userId", &user_id, PUBLIC_KEY_LENGTH).is_ok() {
        UserRepo::find_by_public_signing_key(&state.pool, &user_id).await?
    } else {
        UserRepo::find_by_display_name(&state.pool, &user_id).await?
    };

    let user = user.ok_or(CoreError::NotFound {
        entity: "User",
        id: user_id,
    })?;

    Ok(Json(DataResponse {
        data: UserInfo::from(user),
    }))
}

// ---------------------------------------------------------------------------
// Profile updates
// ---------------------------------------------------------------------------

/// PUT /api/v1/users/display-name
pub async fn update_display_name(
    State(state): State<AppState>,
    AppJson(input): AppJson<UpdateDisplayNameRequest>,
) -> AppResult<impl IntoResponse> {
    let display_name = require("displayName", input.display_name.as_deref())?;

    let user = authorize(
        &state,
        input.public_signing_key.as_deref(),
        input.proof.as_deref(),
        actions::UPDATE_DISPLAY_NAME,
    )
    .await?;

    let (signed, opened) =
        open_signed_text("displayName", display_name, MAX_SIGNED_VALUE_LENGTH, &user)?;

    let length = opened.chars().count();
    if length > MAX_DISPLAY_NAME_LENGTH {
        return Err(CoreError::Validation(format!(
            "Display name too long (>{MAX_DISPLAY_NAME_LENGTH} characters)"
        ))
        .into());
    }
    if length < MIN_DISPLAY_NAME_LENGTH {
        return Err(CoreError::Validation(format!(
            "Display name too short (<{MIN_DISPLAY_NAME_LENGTH} characters)"
        ))
        .into());
    }

    UserRepo::update_display_name(&state.pool, &user.id, &opened, &signed)
        .await
        .map_err(|e| {
            if sealpost_db::is_unique_violation(&e) {
                AppError::Core(CoreError::Conflict(format!(
                    "Display name '{opened}' is already taken"
                )))
            } else {
                AppError::Database(e)
            }
        })?;

    tracing::info!(user_id = %user.id, "Display name updated");
    Ok(Json(Ack::ok()))
}

/// PUT /api/v1/users/status
pub async fn update_status(
    State(state): State<AppState>,
    AppJson(input): AppJson<UpdateStatusRequest>,
) -> AppResult<impl IntoResponse> {
    let status = require("status", input.status.as_deref())?;

    let user = authorize(
        &state,
        input.public_signing_key.as_deref(),
        input.proof.as_deref(),
        actions::UPDATE_STATUS,
    )
    .await?;

    let (signed, opened) = open_signed_text("status", status, MAX_SIGNED_VALUE_LENGTH, &user)?;
    if opened.chars().count() > MAX_STATUS_LENGTH {
        return Err(CoreError::Validation(format!(
            "Status too long (>{MAX_STATUS_LENGTH} characters)"
        ))
        .into());
    }

    let status = (!opened.is_empty()).then_some(opened.as_str());
    UserRepo::update_status(&state.pool, &user.id, status, &signed).await?;

    tracing::info!(user_id = %user.id, cleared = status.is_none(), "Status updated");
    Ok(Json(Ack::ok()))
}

// ---------------------------------------------------------------------------
// Settings sync
// ---------------------------------------------------------------------------

/// PUT /api/v1/users/settings
pub async fn sync_settings(
    State(state): State<AppState>,
    AppJson(input): AppJson<SyncSettingsRequest>,
) -> AppResult<impl IntoResponse> {
    let settings = require("settings", input.settings.as_deref())?;
    let nonce = require("settingsNonce", input.settings_nonce.as_deref())?;
    let settings = decode_base64("settings", settings, MAX_SETTINGS_BASE64_LENGTH)?;
    validate_hex_key("settingsNonce", nonce, SALT_BYTES)?;

    let user = authorize(
        &state,
        input.public_signing_key.as_deref(),
        input.proof.as_deref(),
        actions::SYNC_SETTINGS,
    )
    .await?;

    UserRepo::update_settings(&state.pool, &user.id, &settings, nonce).await?;

    tracing::info!(user_id = %user.id, bytes = settings.len(), "Settings synced");
    Ok(Json(Ack::ok()))
}

/// GET /api/v1/users/settings?publicSigningKey=&proof=
pub async fn retrieve_settings(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<ProofParams>,
) -> AppResult<impl IntoResponse> {
    let user = authorize(
        &state,
        params.public_signing_key.as_deref(),
        params.proof.as_deref(),
        actions::RETRIEVE_SETTINGS,
    )
    .await?;

    let data = match user.settings {
        Some(settings) => SettingsView {
            settings: Some(encode_base64(&settings)),
            settings_nonce: user.settings_nonce,
        },
        None => SettingsView {
            settings: None,
            settings_nonce: None,
        },
    };

    Ok(Json(DataResponse { data }))
}
