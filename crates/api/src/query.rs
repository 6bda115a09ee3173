//! Shared query parameter types for API handlers.
//!
//! Every field is optional so a missing parameter surfaces as a
//! `VALIDATION_ERROR` naming it, not as an extractor rejection.

use serde::Deserialize;

/// `?secretId=` for the contact, block and mute listings.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretIdParams {
    pub secret_id: Option<String>,
}

/// `?conversationId=&before=&count=` for message listing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMessagesParams {
    pub conversation_id: Option<String>,
    pub before: Option<String>,
    pub count: Option<String>,
}

/// `?conversationId=&sessionId=` for opening an event stream.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamParams {
    pub conversation_id: Option<String>,
    pub session_id: Option<String>,
}

/// `?publicSigningKey=&proof=` for proof-gated reads.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofParams {
    pub public_signing_key: Option<String>,
    pub proof: Option<String>,
}
