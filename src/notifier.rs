//! Change Notifier (spec component C6): a single-channel broadcaster of the
//! opaque `stateChanged` signal, replacing the original's
//! `socketio.emit("stateChanged")`. Grounded in the teacher's
//! `events::EventSender` wrapper around a `tokio` channel, simplified to one
//! payload-less event and a broadcast channel so every connected WebSocket
//! client receives it independently.

use tokio::sync::broadcast;
use tracing::debug;

const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy)]
pub struct StateChanged;

/// Best-effort broadcaster. A subscriber that lags behind or has
/// disconnected simply misses the tick and re-queries REST on its next
/// poll; `broadcast()` never blocks and is always called after commit, never
/// from within a transaction.
#[derive(Debug, Clone)]
pub struct ChangeNotifier {
    sender: broadcast::Sender<StateChanged>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StateChanged> {
        self.sender.subscribe()
    }

    /// Publishes `stateChanged` to every current subscriber. Delivery is
    /// best-effort: if there are no subscribers this is a no-op.
    pub fn broadcast(&self) {
        let receiver_count = self.sender.receiver_count();
        match self.sender.send(StateChanged) {
            Ok(_) => debug!(subscribers = receiver_count, "broadcast stateChanged"),
            Err(_) => debug!("broadcast stateChanged with no subscribers"),
        }
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}
