use axum::routing::{get, post};
use axum::Router;

use crate::handlers::stream;
use crate::state::AppState;

/// Event stream routes mounted at `/stream`.
///
/// ```text
/// GET  /           -> open_stream
/// POST /heartbeat  -> heartbeat
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(stream::open_stream))
        .route("/heartbeat", post(stream::heartbeat))
}
