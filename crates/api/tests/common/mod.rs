//! Shared helpers for API integration tests.
//!
//! Not every test binary uses every helper.
#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Method, Request, Response, StatusCode};
use axum::Router;
use ed25519_dalek::SigningKey;
use http_body_util::BodyExt;
use sqlx::SqlitePool;
use tower::ServiceExt;

use sealpost_api::config::ServerConfig;
use sealpost_api::router::build_app_router;
use sealpost_api::state::AppState;
use sealpost_core::proof::{sign_attached, ProofToken, DEFAULT_NAMESPACE};
use sealpost_core::validation::encode_base64;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_url: "sqlite::memory:".to_string(),
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        proof_namespace: DEFAULT_NAMESPACE.to_string(),
        max_proof_age_ms: 60_000,
        channel_idle_ms: 15_000,
        sweep_interval_ms: 5_000,
    }
}

/// Build application state over the given pool.
pub fn build_test_state(pool: SqlitePool) -> AppState {
    AppState::new(pool, test_config())
}

/// Build the full application router with all middleware layers, using the
/// given database pool.
pub fn build_test_app(pool: SqlitePool) -> Router {
    build_app_router(build_test_state(pool), &test_config())
}

/// Router and state sharing one registry, for tests that observe streams.
pub fn build_test_app_with_state(pool: SqlitePool) -> (Router, AppState) {
    let state = build_test_state(pool);
    (build_app_router(state.clone(), &test_config()), state)
}

// ---------------------------------------------------------------------------
// HTTP helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn send_json(
    app: Router,
    method: Method,
    uri: &str,
    body: serde_json::Value,
) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send_json(app, Method::POST, uri, body).await
}

pub async fn put_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send_json(app, Method::PUT, uri, body).await
}

pub async fn delete_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send_json(app, Method::DELETE, uri, body).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Assert the status and return the parsed body.
pub async fn expect_status(response: Response<Body>, status: StatusCode) -> serde_json::Value {
    let actual = response.status();
    let json = body_json(response).await;
    assert_eq!(actual, status, "unexpected status, body: {json}");
    json
}

// ---------------------------------------------------------------------------
// Key and proof helpers
// ---------------------------------------------------------------------------

/// Deterministic signing key for a test identity.
pub fn test_key(seed: u8) -> SigningKey {
    SigningKey::from_bytes(&[seed; 32])
}

pub fn key_hex(key: &SigningKey) -> String {
    hex::encode(key.verifying_key().to_bytes())
}

/// A fresh proof for `action`, base64-encoded.
pub fn proof(key: &SigningKey, action: &str) -> String {
    let now = chrono::Utc::now().timestamp_millis();
    proof_at(key, action, now)
}

pub fn proof_at(key: &SigningKey, action: &str, issued_at: i64) -> String {
    let token = ProofToken::new(DEFAULT_NAMESPACE, action, issued_at).encode();
    encode_base64(&sign_attached(key, token.as_bytes()))
}

/// `text` signed by `key` in attached form, base64-encoded.
pub fn signed_text(key: &SigningKey, text: &str) -> String {
    encode_base64(&sign_attached(key, text.as_bytes()))
}

/// 32-byte id as lowercase hex, filled with `byte`.
pub fn hex_id(byte: u8) -> String {
    format!("{byte:02x}").repeat(32)
}

/// 24-byte salt as lowercase hex.
pub fn salt(byte: u8) -> String {
    format!("{byte:02x}").repeat(24)
}

/// Register `key` with a derived encryption key.
pub async fn register(app: Router, key: &SigningKey) {
    let encryption_key = hex_id(key.to_bytes()[0].wrapping_add(128));
    let response = post_json(
        app,
        "/api/v1/users",
        serde_json::json!({
            "publicSigningKey": key_hex(key),
            "publicEncryptionKey": encryption_key,
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

/// Percent-encode a query parameter value (base64 proofs carry `+/=`).
pub fn query_escape(value: &str) -> String {
    value
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{b:02X}"),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// SSE helpers
// ---------------------------------------------------------------------------

/// Read frames until the next `data:` line and parse it as JSON.
///
/// Skips the `retry:` preamble and keep-alive comments. Panics after five
/// seconds without an event.
pub async fn next_sse_event(body: &mut Body) -> serde_json::Value {
    let read = async {
        let mut buffer = String::new();
        loop {
            if let Some(end) = buffer.find("\n\n") {
                let block: String = buffer.drain(..end + 2).collect();
                if let Some(data) = block.lines().find_map(|l| l.strip_prefix("data:")) {
                    return serde_json::from_str(data.trim()).unwrap();
                }
                continue;
            }
            let frame = body
                .frame()
                .await
                .expect("stream ended before an event arrived")
                .unwrap();
            if let Ok(bytes) = frame.into_data() {
                buffer.push_str(std::str::from_utf8(&bytes).unwrap());
            }
        }
    };
    tokio::time::timeout(std::time::Duration::from_secs(5), read)
        .await
        .expect("timed out waiting for an SSE event")
}

/// Open `/api/v1/stream` and return the response (body still streaming).
pub async fn open_stream(app: Router, conversation_id: &str, session_id: &str) -> Response<Body> {
    get(
        app,
        &format!("/api/v1/stream?conversationId={conversation_id}&sessionId={session_id}"),
    )
    .await
}
