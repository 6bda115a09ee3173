//! Server-Sent Events stream and its heartbeat.
//!
//! A client opens one stream per session and conversation, then keeps it
//! alive with `POST /stream/heartbeat`. Dropping the connection closes the
//! channel; missing heartbeats lets the sweep close it.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::Json;
use futures::stream::{self, Stream, StreamExt};
use sealpost_core::validation::{require, validate_hex_key, ID_BYTES};
use sealpost_events::{ChannelHandle, ChannelRegistry};
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::error::AppResult;
use crate::extract::{AppJson, AppQuery};
use crate::query::StreamParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Reconnect delay advertised to clients.
const CLIENT_RETRY: Duration = Duration::from_millis(10_000);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatRequest {
    pub conversation_id: Option<String>,
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HeartbeatStatus {
    /// Whether the session had an open channel to renew.
    pub live: bool,
}

/// Closes the channel when the SSE body is dropped.
struct ChannelGuard {
    registry: Arc<ChannelRegistry>,
    handle: Option<ChannelHandle>,
}

impl Drop for ChannelGuard {
    fn drop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        // Outside a runtime (process teardown) the registry is going away too.
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            let registry = Arc::clone(&self.registry);
            runtime.spawn(async move {
                registry.close(&handle).await;
            });
        }
    }
}

/// GET /api/v1/stream?conversationId=&sessionId=
///
/// Open an event stream. A session id already in use is rejected with 409
/// and the existing stream keeps running.
pub async fn open_stream(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<StreamParams>,
) -> AppResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let conversation_id = require("conversationId", params.conversation_id.as_deref())?;
    let session_id = require("sessionId", params.session_id.as_deref())?;
    validate_hex_key("conversationId", conversation_id, ID_BYTES)?;
    validate_hex_key("sessionId", session_id, ID_BYTES)?;

    let (handle, rx) = state.registry.subscribe(session_id, conversation_id).await?;
    let guard = ChannelGuard {
        registry: Arc::clone(&state.registry),
        handle: Some(handle),
    };

    let retry = stream::once(async { Ok::<_, Infallible>(Event::default().retry(CLIENT_RETRY)) });
    let events = UnboundedReceiverStream::new(rx).filter_map(move |event| {
        let _guard = &guard;
        let frame = match Event::default().json_data(&event) {
            Ok(frame) => Some(Ok::<_, Infallible>(frame)),
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize stream event");
                None
            }
        };
        async move { frame }
    });

    Ok(Sse::new(retry.chain(events)).keep_alive(KeepAlive::default()))
}

/// POST /api/v1/stream/heartbeat
///
/// Renew a session's channel. An unknown session is not an error; the
/// response reports whether anything was renewed.
pub async fn heartbeat(
    State(state): State<AppState>,
    AppJson(input): AppJson<HeartbeatRequest>,
) -> AppResult<impl IntoResponse> {
    let conversation_id = require("conversationId", input.conversation_id.as_deref())?;
    let session_id = require("sessionId", input.session_id.as_deref())?;
    validate_hex_key("conversationId", conversation_id, ID_BYTES)?;
    validate_hex_key("sessionId", session_id, ID_BYTES)?;

    let live = state.registry.renew(session_id).await;
    tracing::trace!(session_id, live, "Heartbeat");

    Ok(Json(DataResponse {
        data: HeartbeatStatus { live },
    }))
}
