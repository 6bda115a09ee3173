//! Periodic idle-channel sweeper.
//!
//! Spawned once at startup; every `interval` it asks the registry to close
//! channels that missed their heartbeats and to PING the survivors.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::registry::ChannelRegistry;

/// Default sweep period.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_millis(5_000);

/// Run the sweep loop until `cancel` is triggered.
pub async fn run(registry: Arc<ChannelRegistry>, interval: Duration, cancel: CancellationToken) {
    tracing::info!(
        interval_ms = interval.as_millis() as u64,
        idle_threshold_ms = registry.idle_threshold().as_millis() as u64,
        "Channel sweep started"
    );

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Channel sweep stopping");
                break;
            }
            _ = ticker.tick() => {
                let report = registry.sweep().await;
                if report.evicted > 0 || report.failed > 0 {
                    tracing::info!(
                        evicted = report.evicted,
                        failed = report.failed,
                        pinged = report.pinged,
                        "Channel sweep closed channels"
                    );
                } else {
                    tracing::debug!(pinged = report.pinged, "Channel sweep");
                }
            }
        }
    }
}

/// Spawn [`run`] on the current runtime.
pub fn spawn(
    registry: Arc<ChannelRegistry>,
    interval: Duration,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(run(registry, interval, cancel))
}
