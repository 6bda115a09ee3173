//! Registry of live per-session push channels.
//!
//! Each channel belongs to exactly one session and one conversation. A
//! channel stays open while its client keeps renewing it; a sweep closes
//! every channel whose last renewal is older than the idle threshold.
//! Delivering an event never counts as a renewal.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use sealpost_core::types::Timestamp;
use tokio::sync::{mpsc, RwLock};
use tokio::time::Instant;

use crate::event::StreamEvent;

/// Default idle threshold: 15 seconds without a heartbeat.
pub const DEFAULT_IDLE_THRESHOLD: Duration = Duration::from_millis(15_000);

// ---------------------------------------------------------------------------
// Delivery
// ---------------------------------------------------------------------------

/// The channel's transport went away.
#[derive(Debug, thiserror::Error)]
#[error("delivery transport closed")]
pub struct DeliveryError;

/// Pushes one event down a channel's transport.
pub trait Delivery: Send + Sync {
    fn deliver(&self, event: &StreamEvent) -> Result<(), DeliveryError>;
}

impl Delivery for mpsc::UnboundedSender<StreamEvent> {
    fn deliver(&self, event: &StreamEvent) -> Result<(), DeliveryError> {
        self.send(event.clone()).map_err(|_| DeliveryError)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Session '{0}' is already subscribed")]
    SessionInUse(String),
}

// ---------------------------------------------------------------------------
// Channel
// ---------------------------------------------------------------------------

struct Channel {
    /// Distinguishes successive channels that reuse one session id.
    channel_id: u64,
    conversation_id: String,
    last_liveness: Instant,
    opened_at: Timestamp,
    delivery: Box<dyn Delivery>,
}

/// Identifies the channel a caller opened, for closing it later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelHandle {
    pub session_id: String,
    pub channel_id: u64,
}

/// Outcome of one sweep pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    /// Channels removed for exceeding the idle threshold.
    pub evicted: usize,
    /// Survivors that accepted the PING.
    pub pinged: usize,
    /// Survivors whose transport was dead; they were closed.
    pub failed: usize,
}

// ---------------------------------------------------------------------------
// ChannelRegistry
// ---------------------------------------------------------------------------

/// Owns every open channel, keyed by session id.
///
/// Subscribe, renew, sweep and close take the write lock; publish takes the
/// read lock, so a publish never observes a half-applied sweep. Wrap in
/// `Arc` to share across handlers and the sweep task.
pub struct ChannelRegistry {
    channels: RwLock<HashMap<String, Channel>>,
    idle_threshold: Duration,
    next_channel_id: AtomicU64,
}

impl ChannelRegistry {
    pub fn new(idle_threshold: Duration) -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            idle_threshold,
            next_channel_id: AtomicU64::new(1),
        }
    }

    pub fn idle_threshold(&self) -> Duration {
        self.idle_threshold
    }

    /// Open an mpsc-backed channel for `session_id`.
    ///
    /// Returns the handle and the receiver the transport should drain.
    pub async fn subscribe(
        &self,
        session_id: &str,
        conversation_id: &str,
    ) -> Result<(ChannelHandle, mpsc::UnboundedReceiver<StreamEvent>), RegistryError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = self
            .attach_at(session_id, conversation_id, Box::new(tx), Instant::now())
            .await?;
        Ok((handle, rx))
    }

    /// Register `delivery` as the channel for `session_id`, live as of `now`.
    ///
    /// An already-registered session is rejected and the existing channel
    /// is left untouched.
    pub async fn attach_at(
        &self,
        session_id: &str,
        conversation_id: &str,
        delivery: Box<dyn Delivery>,
        now: Instant,
    ) -> Result<ChannelHandle, RegistryError> {
        let mut channels = self.channels.write().await;
        if channels.contains_key(session_id) {
            tracing::debug!(session_id, "Subscribe rejected: session in use");
            return Err(RegistryError::SessionInUse(session_id.to_string()));
        }

        let channel_id = self.next_channel_id.fetch_add(1, Ordering::Relaxed);
        channels.insert(
            session_id.to_string(),
            Channel {
                channel_id,
                conversation_id: conversation_id.to_string(),
                last_liveness: now,
                opened_at: chrono::Utc::now(),
                delivery,
            },
        );
        tracing::info!(session_id, conversation_id, channel_id, "Channel opened");

        Ok(ChannelHandle {
            session_id: session_id.to_string(),
            channel_id,
        })
    }

    /// Mark `session_id` live now. Returns `false` if no such channel is open.
    pub async fn renew(&self, session_id: &str) -> bool {
        self.renew_at(session_id, Instant::now()).await
    }

    pub async fn renew_at(&self, session_id: &str, now: Instant) -> bool {
        match self.channels.write().await.get_mut(session_id) {
            Some(channel) => {
                channel.last_liveness = now;
                true
            }
            None => false,
        }
    }

    /// Deliver `event` to every channel bound to `conversation_id`.
    ///
    /// Returns how many channels accepted it. Dead transports are skipped
    /// here and reaped by the next sweep.
    pub async fn publish(&self, conversation_id: &str, event: &StreamEvent) -> usize {
        let channels = self.channels.read().await;
        let mut delivered = 0;
        for (session_id, channel) in channels.iter() {
            if channel.conversation_id != conversation_id {
                continue;
            }
            match channel.delivery.deliver(event) {
                Ok(()) => delivered += 1,
                Err(e) => tracing::debug!(session_id, error = %e, "Publish skipped dead channel"),
            }
        }
        delivered
    }

    /// Close idle channels and PING the rest.
    pub async fn sweep(&self) -> SweepReport {
        self.sweep_at(Instant::now()).await
    }

    pub async fn sweep_at(&self, now: Instant) -> SweepReport {
        let mut channels = self.channels.write().await;
        let mut report = SweepReport::default();

        let expired: Vec<String> = channels
            .iter()
            .filter(|(_, channel)| {
                now.saturating_duration_since(channel.last_liveness) > self.idle_threshold
            })
            .map(|(session_id, _)| session_id.clone())
            .collect();
        for session_id in expired {
            if let Some(channel) = channels.remove(&session_id) {
                tracing::info!(
                    session_id,
                    conversation_id = %channel.conversation_id,
                    "Channel closed: idle timeout"
                );
                report.evicted += 1;
            }
        }

        let mut dead = Vec::new();
        for (session_id, channel) in channels.iter() {
            match channel.delivery.deliver(&StreamEvent::ping(&channel.conversation_id)) {
                Ok(()) => report.pinged += 1,
                Err(e) => {
                    tracing::warn!(session_id, error = %e, "PING failed, closing channel");
                    dead.push(session_id.clone());
                }
            }
        }
        for session_id in dead {
            channels.remove(&session_id);
            report.failed += 1;
        }

        report
    }

    /// Close the channel behind `handle` after its transport went away.
    ///
    /// A newer channel that reused the session id is left alone.
    pub async fn close(&self, handle: &ChannelHandle) -> bool {
        let mut channels = self.channels.write().await;
        let current = channels
            .get(&handle.session_id)
            .is_some_and(|channel| channel.channel_id == handle.channel_id);
        if !current {
            return false;
        }

        if let Some(channel) = channels.remove(&handle.session_id) {
            let open_for = chrono::Utc::now() - channel.opened_at;
            tracing::info!(
                session_id = %handle.session_id,
                open_secs = open_for.num_seconds(),
                "Channel closed: transport gone"
            );
        }
        true
    }

    pub async fn is_open(&self, session_id: &str) -> bool {
        self.channels.read().await.contains_key(session_id)
    }

    /// Return the current number of open channels.
    pub async fn channel_count(&self) -> usize {
        self.channels.read().await.len()
    }

    /// Drop every channel. Receivers observe end-of-stream.
    ///
    /// Used during graceful shutdown.
    pub async fn shutdown_all(&self) {
        let mut channels = self.channels.write().await;
        let count = channels.len();
        channels.clear();
        tracing::info!(count, "Closed all event channels");
    }
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_IDLE_THRESHOLD)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    use super::*;
    use crate::event::EventType;

    /// Delivery that always fails, as a crashed transport would.
    struct Broken;

    impl Delivery for Broken {
        fn deliver(&self, _event: &StreamEvent) -> Result<(), DeliveryError> {
            Err(DeliveryError)
        }
    }

    /// Delivery that counts calls.
    struct Counting(Arc<AtomicUsize>);

    impl Delivery for Counting {
        fn deliver(&self, _event: &StreamEvent) -> Result<(), DeliveryError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn sample_event(conversation_id: &str) -> StreamEvent {
        StreamEvent::new(
            EventType::DeleteMessage,
            conversation_id,
            serde_json::json!({ "messageId": "m1" }),
        )
    }

    #[tokio::test]
    async fn publish_reaches_only_matching_conversation() {
        let registry = ChannelRegistry::default();
        let (_, mut rx_a) = registry.subscribe("s1", "conv-a").await.unwrap();
        let (_, mut rx_b) = registry.subscribe("s2", "conv-b").await.unwrap();

        let delivered = registry.publish("conv-a", &sample_event("conv-a")).await;

        assert_eq!(delivered, 1);
        assert_eq!(rx_a.recv().await.unwrap().conversation_id, "conv-a");
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn publish_without_channels_is_noop() {
        let registry = ChannelRegistry::default();
        assert_eq!(registry.publish("nobody", &sample_event("nobody")).await, 0);
    }

    #[tokio::test]
    async fn duplicate_session_is_rejected_and_original_keeps_receiving() {
        let registry = ChannelRegistry::default();
        let (_, mut original) = registry.subscribe("s1", "conv").await.unwrap();

        let second = registry.subscribe("s1", "conv").await;
        assert!(matches!(second, Err(RegistryError::SessionInUse(id)) if id == "s1"));

        registry.publish("conv", &sample_event("conv")).await;
        assert!(original.recv().await.is_some());
        assert_eq!(registry.channel_count().await, 1);
    }

    #[tokio::test]
    async fn idle_channel_is_swept_and_stops_receiving() {
        let registry = ChannelRegistry::new(Duration::from_millis(15_000));
        let t0 = Instant::now();
        let (tx, mut rx) = mpsc::unbounded_channel();
        registry.attach_at("s1", "conv", Box::new(tx), t0).await.unwrap();

        let report = registry.sweep_at(t0 + Duration::from_millis(15_001)).await;

        assert_eq!(report.evicted, 1);
        assert!(!registry.is_open("s1").await);
        assert_eq!(registry.publish("conv", &sample_event("conv")).await, 0);
        // Sender dropped with the channel: the stream ends.
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn channel_at_threshold_survives_and_is_pinged() {
        let registry = ChannelRegistry::new(Duration::from_millis(15_000));
        let t0 = Instant::now();
        let (tx, mut rx) = mpsc::unbounded_channel();
        registry.attach_at("s1", "conv", Box::new(tx), t0).await.unwrap();

        let report = registry.sweep_at(t0 + Duration::from_millis(15_000)).await;

        assert_eq!(report, SweepReport { evicted: 0, pinged: 1, failed: 0 });
        let ping = rx.recv().await.unwrap();
        assert_eq!(ping.event_type, EventType::Ping);
        assert_eq!(ping.conversation_id, "conv");
    }

    #[tokio::test]
    async fn renew_defers_eviction_but_publish_does_not() {
        let registry = ChannelRegistry::new(Duration::from_millis(100));
        let t0 = Instant::now();
        let count = Arc::new(AtomicUsize::new(0));
        registry
            .attach_at("renewed", "conv", Box::new(Counting(count.clone())), t0)
            .await
            .unwrap();
        registry
            .attach_at("silent", "conv", Box::new(Counting(count.clone())), t0)
            .await
            .unwrap();

        assert!(registry.renew_at("renewed", t0 + Duration::from_millis(80)).await);
        assert_eq!(registry.publish("conv", &sample_event("conv")).await, 2);
        assert_eq!(count.load(Ordering::SeqCst), 2);

        let report = registry.sweep_at(t0 + Duration::from_millis(150)).await;
        assert_eq!(report.evicted, 1);
        assert!(registry.is_open("renewed").await);
        assert!(!registry.is_open("silent").await);
    }

    #[tokio::test]
    async fn renew_unknown_session_returns_false() {
        let registry = ChannelRegistry::default();
        assert!(!registry.renew("ghost").await);
    }

    #[tokio::test]
    async fn failed_ping_closes_only_that_channel() {
        let registry = ChannelRegistry::default();
        let now = Instant::now();
        let (tx, _rx) = mpsc::unbounded_channel();
        registry.attach_at("healthy", "conv", Box::new(tx), now).await.unwrap();
        registry.attach_at("broken", "conv", Box::new(Broken), now).await.unwrap();

        let report = registry.sweep_at(now).await;

        assert_eq!(report, SweepReport { evicted: 0, pinged: 1, failed: 1 });
        assert!(registry.is_open("healthy").await);
        assert!(!registry.is_open("broken").await);
    }

    #[tokio::test]
    async fn stale_handle_does_not_close_reused_session() {
        let registry = ChannelRegistry::new(Duration::from_millis(10));
        let t0 = Instant::now();
        let (tx, _rx) = mpsc::unbounded_channel();
        let old = registry.attach_at("s1", "conv", Box::new(tx), t0).await.unwrap();
        registry.sweep_at(t0 + Duration::from_millis(11)).await;

        let (new, _rx2) = registry.subscribe("s1", "conv").await.unwrap();
        assert_ne!(old.channel_id, new.channel_id);

        assert!(!registry.close(&old).await);
        assert!(registry.is_open("s1").await);
        assert!(registry.close(&new).await);
        assert!(!registry.is_open("s1").await);
    }

    #[tokio::test]
    async fn shutdown_all_ends_every_stream() {
        let registry = ChannelRegistry::default();
        let (_, mut rx1) = registry.subscribe("s1", "a").await.unwrap();
        let (_, mut rx2) = registry.subscribe("s2", "b").await.unwrap();

        registry.shutdown_all().await;

        assert_eq!(registry.channel_count().await, 0);
        assert!(rx1.recv().await.is_none());
        assert!(rx2.recv().await.is_none());
    }
}
