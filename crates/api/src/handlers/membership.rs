//! Handlers for the block and mute lists.
//!
//! Both lists share one shape: entries keyed by `combinedId`, filed under
//! a `secretId`. Only the accepted action verbs differ.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use sealpost_core::error::CoreError;
use sealpost_core::validation::{require, validate_hex_key, ID_BYTES};
use sealpost_db::models::membership::MembershipList;
use sealpost_db::repositories::MembershipRepo;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::extract::{AppJson, AppQuery};
use crate::query::SecretIdParams;
use crate::response::{Ack, DataResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipRequest {
    pub action: Option<String>,
    pub combined_id: Option<String>,
    pub secret_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipView {
    pub combined_id: String,
}

/// Action verbs for a list: (add, remove).
fn verbs(list: MembershipList) -> (&'static str, &'static str) {
    match list {
        MembershipList::Blocked => ("block", "unblock"),
        MembershipList::Muted => ("mute", "unmute"),
    }
}

async fn apply(
    state: &AppState,
    list: MembershipList,
    input: MembershipRequest,
) -> AppResult<Json<DataResponse<Ack>>> {
    let combined_id = require("combinedId", input.combined_id.as_deref())?;
    let secret_id = require("secretId", input.secret_id.as_deref())?;
    let action = require("action", input.action.as_deref())?;
    validate_hex_key("secretId", secret_id, ID_BYTES)?;
    validate_hex_key("combinedId", combined_id, ID_BYTES)?;

    let (add, remove) = verbs(list);
    if action == add {
        let inserted = MembershipRepo::add(&state.pool, list, combined_id, secret_id).await?;
        tracing::debug!(table = list.table(), inserted, "Membership add");
    } else if action == remove {
        let removed = MembershipRepo::remove(&state.pool, list, combined_id).await?;
        tracing::debug!(table = list.table(), removed, "Membership remove");
    } else {
        return Err(CoreError::Validation("Invalid value for 'action'".to_string()).into());
    }

    Ok(Json(Ack::ok()))
}

async fn list_entries(
    state: &AppState,
    list: MembershipList,
    params: SecretIdParams,
) -> AppResult<Json<DataResponse<Vec<MembershipView>>>> {
    let secret_id = require("secretId", params.secret_id.as_deref())?;
    validate_hex_key("secretId", secret_id, ID_BYTES)?;

    let entries = MembershipRepo::list_by_secret_id(&state.pool, list, secret_id).await?;
    let data = entries
        .into_iter()
        .map(|entry| MembershipView {
            combined_id: entry.combined_id,
        })
        .collect();

    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/blocks
pub async fn update_block(
    State(state): State<AppState>,
    AppJson(input): AppJson<MembershipRequest>,
) -> AppResult<impl IntoResponse> {
    apply(&state, MembershipList::Blocked, input).await
}

/// GET /api/v1/blocks?secretId=
pub async fn list_blocks(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<SecretIdParams>,
) -> AppResult<impl IntoResponse> {
    list_entries(&state, MembershipList::Blocked, params).await
}

/// POST /api/v1/mutes
pub async fn update_mute(
    State(state): State<AppState>,
    AppJson(input): AppJson<MembershipRequest>,
) -> AppResult<impl IntoResponse> {
    apply(&state, MembershipList::Muted, input).await
}

/// GET /api/v1/mutes?secretId=
pub async fn list_mutes(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<SecretIdParams>,
) -> AppResult<impl IntoResponse> {
    list_entries(&state, MembershipList::Muted, params).await
}
