//! Cooperative cancellation for an in-flight background run.
//!
//! Owner detachment deliberately does NOT cancel — the whole point is that the
//! work survives owner recreation. This handle exists for the final-teardown
//! path, where the caller knows no owner will ever come back: the supervisor's
//! runner handle keeps one copy, the spawned worker keeps another and races
//! its work against the signal.

use tokio::sync::watch;

/// A cooperative cancellation signal for a single background run.
///
/// Thin wrapper over the sender side of a `tokio::sync::watch` channel; every
/// clone observes the same one-way latch. Once set it never resets, matching
/// the run-once lifecycle: a torn-down task is torn down for good.
#[derive(Clone)]
pub struct CancellationHandle {
    tx: watch::Sender<bool>,
}

impl CancellationHandle {
    /// Create a handle for a run that has not been torn down.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    /// Request teardown of the run. Idempotent — multiple calls are safe.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Check if teardown has been requested.
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Wait until teardown is requested.
    ///
    /// Returns immediately if already requested. This is the worker's side of
    /// the race: `select!`-ed against the unit of work.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancellationHandle {
    fn default() -> Self {
        Self::new()
    }
}
