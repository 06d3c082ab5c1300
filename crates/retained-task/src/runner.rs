//! The background unit of work and its runtime handle.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::sync::watch;
use tracing::debug;

use crate::cancellation::CancellationHandle;
use crate::state_machine::{self, TaskPhase};

/// Boxed async unit of work — the actual operation to execute.
///
/// Resolves to the run's single result, delivered to whichever listener is
/// attached at completion time (or buffered if none is).
pub type BoxedTaskWork =
    Box<dyn FnOnce() -> Pin<Box<dyn Future<Output = String> + Send>> + Send>;

/// A fixed-count delay loop standing in for a long-running computation.
///
/// Logs each iteration at debug level and resolves to the literal
/// `"All done!!!"`. The loop blocks only its own worker; the owner's context
/// is never blocked.
pub fn simulated_work(iterations: u32, step: Duration) -> BoxedTaskWork {
    Box::new(move || {
        Box::pin(async move {
            for i in 0..iterations {
                debug!(iteration = i, "background work tick");
                tokio::time::sleep(step).await;
            }
            "All done!!!".to_string()
        })
    })
}

/// Handle to a spawned background run, obtained from
/// [`TaskSupervisor::runner`](crate::supervisor::TaskSupervisor::runner).
///
/// Tracks the phase via a watch channel and carries the cooperative
/// cancellation handle. The worker itself holds only a weak back-reference to
/// the supervisor, so dropping this handle (and the supervisor that owns it)
/// never keeps an owner alive — a completion arriving afterwards is silently
/// discarded.
#[derive(Clone)]
pub struct TaskRunner {
    phase_rx: watch::Receiver<TaskPhase>,
    cancellation: CancellationHandle,
}

impl TaskRunner {
    pub(crate) fn new(
        phase_rx: watch::Receiver<TaskPhase>,
        cancellation: CancellationHandle,
    ) -> Self {
        Self {
            phase_rx,
            cancellation,
        }
    }

    /// Current phase of the run.
    pub fn phase(&self) -> TaskPhase {
        *self.phase_rx.borrow()
    }

    /// Request cooperative cancellation of the run.
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// Check if cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Wait until the run reaches its terminal phase.
    pub async fn await_finished(&self) -> TaskPhase {
        wait_terminal(self.phase_rx.clone()).await
    }

    pub(crate) fn phase_watch(&self) -> watch::Receiver<TaskPhase> {
        self.phase_rx.clone()
    }
}

/// Follow a phase watch until it reports a terminal phase.
///
/// If the sender side goes away first, reports whatever phase was last seen.
pub(crate) async fn wait_terminal(mut rx: watch::Receiver<TaskPhase>) -> TaskPhase {
    let seen = rx
        .wait_for(|phase| state_machine::is_terminal(*phase))
        .await
        .map(|phase| *phase);
    match seen {
        Ok(phase) => phase,
        // Sender gone without ever reporting Finished
        Err(_) => *rx.borrow(),
    }
}
