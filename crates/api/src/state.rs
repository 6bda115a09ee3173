use std::sync::Arc;

use sealpost_core::proof::ProofVerifier;
use sealpost_events::{ChannelRegistry, NotificationDispatcher};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: sealpost_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Open event stream channels.
    pub registry: Arc<ChannelRegistry>,
    /// Publishes message events after commits.
    pub dispatcher: NotificationDispatcher,
    /// Checks signed proofs on sensitive routes.
    pub verifier: Arc<ProofVerifier>,
}

impl AppState {
    /// Wire up registry, dispatcher and verifier from `config`.
    pub fn new(pool: sealpost_db::DbPool, config: ServerConfig) -> Self {
        let registry = Arc::new(ChannelRegistry::new(config.channel_idle_threshold()));
        let dispatcher = NotificationDispatcher::new(Arc::clone(&registry));
        let verifier = Arc::new(ProofVerifier::new(
            config.proof_namespace.clone(),
            config.max_proof_age_ms,
        ));
        tracing::info!(
            namespace = verifier.namespace(),
            freshness_window_ms = verifier.freshness_window_ms(),
            idle_threshold_ms = registry.idle_threshold().as_millis() as u64,
            "Proof verifier and channel registry configured"
        );

        Self {
            pool,
            config: Arc::new(config),
            registry,
            dispatcher,
            verifier,
        }
    }
}
