//! Liveness endpoint for load balancers and operators.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthReport {
    /// `ok`, or `degraded` when the database is unreachable.
    pub status: &'static str,
    pub version: &'static str,
    pub database: &'static str,
    /// Event stream channels currently registered.
    pub open_channels: usize,
    pub channel_idle_ms: u64,
}

/// GET /health
///
/// 503 while the database is down so load balancers drain the instance.
async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let database_up = sealpost_db::health_check(&state.pool).await.is_ok();
    if !database_up {
        tracing::warn!("Health check: database unreachable");
    }

    let report = HealthReport {
        status: if database_up { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        database: if database_up { "up" } else { "down" },
        open_channels: state.registry.channel_count().await,
        channel_idle_ms: state.config.channel_idle_ms,
    };
    let code = if database_up {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (code, Json(report))
}

/// Mounted at the root, outside `/api/v1`.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
