//! Telemetry bus contract and in-memory implementation.
//!
//! The driver publishes sensor edges and alarms and subscribes to the space
//! occupancy feed through this trait. The production transport (an MQTT
//! broker on the space network) is an external collaborator wired up by the
//! process entry point; [`InMemoryBus`] serves development and tests.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::trace;

/// Publish/subscribe contract.
///
/// `publish` is fire-and-forget: delivery failures are the transport's
/// problem, never the driver's. Declared in the desugared RPITIT form with
/// a `Send` bound so publishes can happen inside spawned tasks;
/// implementations may use plain `async fn`.
pub trait TelemetryBus: Send + Sync {
    /// Publish `payload` on `topic`. Fire-and-forget.
    fn publish(&self, topic: &str, payload: &str) -> impl Future<Output = ()> + Send;

    /// Subscribe to `topic`. Messages published after this call are
    /// delivered in order; the subscription ends when the receiver is
    /// dropped.
    fn subscribe(&self, topic: &str) -> mpsc::UnboundedReceiver<String>;
}

/// Process-local bus with per-topic fan-out.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBus {
    topics: Arc<Mutex<HashMap<String, Vec<mpsc::UnboundedSender<String>>>>>,
}

impl InMemoryBus {
    /// Create an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TelemetryBus for InMemoryBus {
    async fn publish(&self, topic: &str, payload: &str) {
        trace!(topic, payload, "telemetry publish");
        let mut topics = self.topics.lock();
        if let Some(subscribers) = topics.get_mut(topic) {
            // Dropped receivers are pruned on the way through.
            subscribers.retain(|tx| tx.send(payload.to_string()).is_ok());
        }
    }

    fn subscribe(&self, topic: &str) -> mpsc::UnboundedReceiver<String> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.topics.lock().entry(topic.to_string()).or_default().push(tx);
        rx
    }
}
