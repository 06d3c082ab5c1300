//! Owner-side coordination: the listener slot, the result buffer, and the
//! single `start()` entry point.
//!
//! `TaskSupervisor` is the long-lived object a transient owner attaches to and
//! detaches from across its destruction/recreation cycles. The background
//! worker references the supervisor's shared state only through a `Weak`, so
//! the work never extends the supervisor's lifetime: once the last strong
//! reference is dropped, a late completion finds nobody home and is discarded.

use std::sync::{Arc, Weak};

use tokio::sync::{Mutex, watch};
use tracing::debug;

use crate::buffer::ResultSlot;
use crate::cancellation::CancellationHandle;
use crate::error::TaskError;
use crate::listener::TaskListener;
use crate::runner::{self, BoxedTaskWork, TaskRunner};
use crate::state_machine::{self, TaskPhase};

/// Owner-side state: the observer slot and the result buffer.
///
/// Guarded by a single mutex so owner-side access is serialized the same way
/// a single-threaded owner context would serialize it. Delivery decisions are
/// made under this lock; the callbacks themselves run after it is released,
/// so a listener is free to call back into its supervisor.
#[derive(Default)]
struct OwnerSlot {
    listener: Option<Arc<dyn TaskListener>>,
    buffered: ResultSlot,
}

struct SupervisorShared {
    owner: Mutex<OwnerSlot>,
    runner: Mutex<Option<TaskRunner>>,
}

/// Coordinates one background run across owner recreations.
///
/// Holds zero-or-one attached [`TaskListener`] at a time. The listener slot
/// may be set and cleared any number of times over the run's lifetime; the
/// run itself is started exactly once.
pub struct TaskSupervisor {
    shared: Arc<SupervisorShared>,
}

impl std::fmt::Debug for TaskSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskSupervisor").finish_non_exhaustive()
    }
}

impl TaskSupervisor {
    /// Create a supervisor with no listener attached and no run started.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(SupervisorShared {
                owner: Mutex::new(OwnerSlot::default()),
                runner: Mutex::new(None),
            }),
        }
    }

    /// Start the background run.
    ///
    /// Transitions `NotStarted -> Running`, issues `on_task_started` to the
    /// currently attached listener (if any), then spawns the worker. Exactly
    /// one `start()` is allowed per supervisor; a second call fails the phase
    /// transition check.
    pub async fn start(&self, work: BoxedTaskWork) -> Result<(), TaskError> {
        let cancellation = CancellationHandle::new();
        let phase_tx = {
            let mut runner_slot = self.shared.runner.lock().await;
            let current = runner_slot
                .as_ref()
                .map(|r| r.phase())
                .unwrap_or(TaskPhase::NotStarted);
            state_machine::validate_transition(current, TaskPhase::Running)?;

            let (phase_tx, phase_rx) = watch::channel(TaskPhase::Running);
            *runner_slot = Some(TaskRunner::new(phase_rx, cancellation.clone()));
            phase_tx
        };

        // The run has begun; let the current owner show it. The worker is not
        // spawned yet, so this always precedes the finished notification.
        let listener = self.shared.owner.lock().await.listener.clone();
        if let Some(listener) = listener {
            listener.on_task_started().await;
        }

        let weak = Arc::downgrade(&self.shared);
        tokio::spawn(async move {
            let result = tokio::select! {
                result = (work)() => Some(result),
                _ = cancellation.cancelled() => {
                    debug!("background work cancelled before completion");
                    None
                }
            };

            if let Some(result) = result {
                deliver_or_buffer(&weak, result).await;
            }

            let _ = phase_tx.send(TaskPhase::Finished);
        });

        Ok(())
    }

    /// Adopt a new observer for the current owner instance.
    ///
    /// A result buffered while no owner was attached is delivered immediately
    /// and the buffer cleared; otherwise, if the run is still in flight,
    /// `on_task_started` is re-issued so the new owner reflects current state.
    /// Attaching when nothing has run and nothing is buffered issues no
    /// notification.
    pub async fn attach(&self, listener: Arc<dyn TaskListener>) {
        // Adopt the listener and drain the buffer under the lock; the
        // callback itself runs after the lock is released.
        let buffered = {
            let mut owner = self.shared.owner.lock().await;
            owner.listener = Some(listener.clone());
            owner.buffered.take()
        };

        if let Some(result) = buffered {
            debug!("delivering buffered result to newly attached listener");
            listener.on_task_finished(result).await;
        } else if self.phase().await == TaskPhase::Running {
            listener.on_task_started().await;
        }
    }

    /// Drop the observer reference for a torn-down owner instance.
    ///
    /// The next notification finds no observer and falls back to buffering.
    /// The background work keeps running — detaching is how the owner avoids
    /// being kept alive, not how the work is stopped. Teardown that truly
    /// ends the task goes through [`cancel`](Self::cancel) instead.
    pub async fn detach(&self) {
        self.shared.owner.lock().await.listener = None;
    }

    /// Request cooperative cancellation of the run, if one is in flight.
    ///
    /// A cancelled run delivers no notification and transitions straight to
    /// `Finished`.
    pub async fn cancel(&self) {
        if let Some(runner) = self.shared.runner.lock().await.as_ref() {
            runner.cancel();
        }
    }

    /// Current phase of the run (`NotStarted` before any `start()`).
    pub async fn phase(&self) -> TaskPhase {
        self.shared
            .runner
            .lock()
            .await
            .as_ref()
            .map(|r| r.phase())
            .unwrap_or(TaskPhase::NotStarted)
    }

    /// Wait until the run reaches its terminal phase.
    ///
    /// Returns immediately with `NotStarted` if no run was ever started.
    pub async fn await_finished(&self) -> TaskPhase {
        let rx = {
            let runner_slot = self.shared.runner.lock().await;
            match runner_slot.as_ref() {
                Some(runner) => runner.phase_watch(),
                None => return TaskPhase::NotStarted,
            }
        };
        runner::wait_terminal(rx).await
    }

    /// Handle to the spawned run, or `None` before any `start()`.
    ///
    /// The handle is a cheap clone sharing the run's phase watch and
    /// cancellation signal, so it can outlive the lock and be held across
    /// owner recreations.
    pub async fn runner(&self) -> Option<TaskRunner> {
        self.shared.runner.lock().await.clone()
    }

    /// Returns `true` if a completed result is waiting for the next attach.
    pub async fn has_buffered_result(&self) -> bool {
        !self.shared.owner.lock().await.buffered.is_empty()
    }
}

impl Default for TaskSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve the weak back-reference at the notification point.
///
/// Owner-side state live and listener attached: deliver directly. Live but
/// detached: buffer for the next attach. Gone for good: discard — the buffer
/// write is conditioned on a live owner, not on whether anyone will read it.
async fn deliver_or_buffer(shared: &Weak<SupervisorShared>, result: String) {
    let Some(shared) = shared.upgrade() else {
        debug!("supervisor gone at completion, discarding result");
        return;
    };

    // Decide under the lock, deliver outside it — the listener may well
    // detach itself the moment the result arrives.
    let listener = {
        let mut owner = shared.owner.lock().await;
        match owner.listener.clone() {
            Some(listener) => listener,
            None => {
                debug!("no listener attached at completion, buffering result");
                owner.buffered.put(result);
                return;
            }
        }
    };
    listener.on_task_finished(result).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::simulated_work;
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio::sync::Notify;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Event {
        Started,
        Finished(String),
    }

    #[derive(Default)]
    struct RecordingListener {
        events: std::sync::Mutex<Vec<Event>>,
    }

    impl RecordingListener {
        fn events(&self) -> Vec<Event> {
            self.events.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TaskListener for RecordingListener {
        async fn on_task_started(&self) {
            self.events.lock().unwrap().push(Event::Started);
        }

        async fn on_task_finished(&self, result: String) {
            self.events.lock().unwrap().push(Event::Finished(result));
        }
    }

    /// Work that blocks until the test releases it, for deterministic
    /// interleaving of attach/detach with completion.
    fn gated_work(gate: Arc<Notify>) -> BoxedTaskWork {
        Box::new(move || {
            Box::pin(async move {
                gate.notified().await;
                "All done!!!".to_string()
            })
        })
    }

    #[tokio::test]
    async fn test_attached_throughout_started_then_finished() {
        let supervisor = TaskSupervisor::new();
        let listener = Arc::new(RecordingListener::default());

        supervisor.attach(listener.clone()).await;
        supervisor
            .start(simulated_work(3, Duration::from_millis(1)))
            .await
            .unwrap();
        supervisor.await_finished().await;

        assert_eq!(
            listener.events(),
            vec![Event::Started, Event::Finished("All done!!!".to_string())]
        );
        assert!(!supervisor.has_buffered_result().await);
    }

    #[tokio::test]
    async fn test_detached_at_completion_buffers_result() {
        let supervisor = TaskSupervisor::new();
        let first = Arc::new(RecordingListener::default());

        supervisor.attach(first.clone()).await;
        supervisor
            .start(simulated_work(2, Duration::from_millis(1)))
            .await
            .unwrap();
        supervisor.detach().await;
        supervisor.await_finished().await;

        // Nobody was listening at completion — the result waits in the slot.
        assert!(supervisor.has_buffered_result().await);
        assert_eq!(first.events(), vec![Event::Started]);

        let second = Arc::new(RecordingListener::default());
        supervisor.attach(second.clone()).await;
        assert_eq!(
            second.events(),
            vec![Event::Finished("All done!!!".to_string())]
        );
        assert!(!supervisor.has_buffered_result().await);
    }

    #[tokio::test]
    async fn test_reattach_mid_run_reissues_started() {
        let supervisor = TaskSupervisor::new();
        let gate = Arc::new(Notify::new());
        let first = Arc::new(RecordingListener::default());

        supervisor.attach(first.clone()).await;
        supervisor.start(gated_work(gate.clone())).await.unwrap();
        supervisor.detach().await;

        let second = Arc::new(RecordingListener::default());
        supervisor.attach(second.clone()).await;
        assert_eq!(second.events(), vec![Event::Started]);

        gate.notify_one();
        supervisor.await_finished().await;
        assert_eq!(
            second.events(),
            vec![Event::Started, Event::Finished("All done!!!".to_string())]
        );
        // The torn-down owner saw only the start.
        assert_eq!(first.events(), vec![Event::Started]);
    }

    #[tokio::test]
    async fn test_second_start_rejected() {
        let supervisor = TaskSupervisor::new();
        let gate = Arc::new(Notify::new());
        supervisor.start(gated_work(gate.clone())).await.unwrap();

        let result = supervisor.start(simulated_work(1, Duration::from_millis(1))).await;
        assert!(result.is_err());
        match result.unwrap_err() {
            TaskError::InvalidTransition { current, requested } => {
                assert_eq!(current, TaskPhase::Running);
                assert_eq!(requested, TaskPhase::Running);
            }
            other => panic!("Expected InvalidTransition, got: {:?}", other),
        }

        gate.notify_one();
        supervisor.await_finished().await;

        // After completion the phase is terminal.
        let result = supervisor.start(simulated_work(1, Duration::from_millis(1))).await;
        match result.unwrap_err() {
            TaskError::TerminalPhase(p) => assert_eq!(p, TaskPhase::Finished),
            other => panic!("Expected TerminalPhase, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_detach_without_run_yields_no_notifications() {
        let supervisor = TaskSupervisor::new();
        let first = Arc::new(RecordingListener::default());
        supervisor.attach(first.clone()).await;
        supervisor.detach().await;

        let second = Arc::new(RecordingListener::default());
        supervisor.attach(second.clone()).await;

        assert_eq!(first.events(), vec![]);
        assert_eq!(second.events(), vec![]);
        assert_eq!(supervisor.phase().await, TaskPhase::NotStarted);
    }

    #[tokio::test]
    async fn test_attach_after_delivery_yields_nothing() {
        let supervisor = TaskSupervisor::new();
        let first = Arc::new(RecordingListener::default());

        supervisor.attach(first.clone()).await;
        supervisor
            .start(simulated_work(1, Duration::from_millis(1)))
            .await
            .unwrap();
        supervisor.await_finished().await;
        supervisor.detach().await;

        // Result already went to the first owner; a later owner sees nothing.
        let second = Arc::new(RecordingListener::default());
        supervisor.attach(second.clone()).await;
        assert_eq!(second.events(), vec![]);
    }

    #[tokio::test]
    async fn test_runner_handle_reachable_after_start() {
        let supervisor = TaskSupervisor::new();
        assert!(supervisor.runner().await.is_none());

        let gate = Arc::new(Notify::new());
        supervisor.start(gated_work(gate)).await.unwrap();

        let runner = supervisor.runner().await.expect("run is in flight");
        assert_eq!(runner.phase(), TaskPhase::Running);

        // Cancelling through the handle tears the run down.
        runner.cancel();
        assert_eq!(runner.await_finished().await, TaskPhase::Finished);
    }

    #[tokio::test]
    async fn test_cancelled_run_delivers_nothing() {
        let supervisor = TaskSupervisor::new();
        let gate = Arc::new(Notify::new());
        let listener = Arc::new(RecordingListener::default());

        supervisor.attach(listener.clone()).await;
        supervisor.start(gated_work(gate)).await.unwrap();
        supervisor.cancel().await;

        assert_eq!(supervisor.await_finished().await, TaskPhase::Finished);
        assert_eq!(listener.events(), vec![Event::Started]);
        assert!(!supervisor.has_buffered_result().await);
    }

    /// Listener that detaches itself from its supervisor the moment the
    /// result arrives, the way a real owner dismissing itself would.
    #[derive(Default)]
    struct SelfDetachingListener {
        supervisor: std::sync::Mutex<Option<Arc<TaskSupervisor>>>,
        finished: std::sync::Mutex<Option<String>>,
    }

    #[async_trait]
    impl TaskListener for SelfDetachingListener {
        async fn on_task_started(&self) {}

        async fn on_task_finished(&self, result: String) {
            let supervisor = self.supervisor.lock().unwrap().take();
            if let Some(supervisor) = supervisor {
                supervisor.detach().await;
            }
            *self.finished.lock().unwrap() = Some(result);
        }
    }

    #[tokio::test]
    async fn test_listener_may_detach_from_within_callback() {
        let supervisor = Arc::new(TaskSupervisor::new());
        let listener = Arc::new(SelfDetachingListener::default());
        *listener.supervisor.lock().unwrap() = Some(supervisor.clone());

        supervisor.attach(listener.clone()).await;
        supervisor
            .start(simulated_work(1, Duration::from_millis(1)))
            .await
            .unwrap();

        // Delivery happens before the phase turns terminal, so a resolved
        // await_finished proves the re-entrant detach went through.
        tokio::time::timeout(Duration::from_secs(2), supervisor.await_finished())
            .await
            .expect("detach from inside the callback must not block delivery");
        assert_eq!(
            listener.finished.lock().unwrap().as_deref(),
            Some("All done!!!")
        );
    }

    #[tokio::test]
    async fn test_listener_may_detach_during_buffered_delivery() {
        let supervisor = Arc::new(TaskSupervisor::new());
        supervisor
            .start(simulated_work(1, Duration::from_millis(1)))
            .await
            .unwrap();
        supervisor.await_finished().await;
        assert!(supervisor.has_buffered_result().await);

        let listener = Arc::new(SelfDetachingListener::default());
        *listener.supervisor.lock().unwrap() = Some(supervisor.clone());

        tokio::time::timeout(
            Duration::from_secs(2),
            supervisor.attach(listener.clone()),
        )
        .await
        .expect("detach from inside buffered delivery must not block attach");
        assert_eq!(
            listener.finished.lock().unwrap().as_deref(),
            Some("All done!!!")
        );
        assert!(!supervisor.has_buffered_result().await);
    }

    #[tokio::test]
    async fn test_supervisor_dropped_discards_late_completion() {
        let supervisor = TaskSupervisor::new();
        let gate = Arc::new(Notify::new());
        let listener = Arc::new(RecordingListener::default());

        supervisor.attach(listener.clone()).await;
        supervisor.start(gated_work(gate.clone())).await.unwrap();

        // Final teardown: the supervisor goes away while the work is in flight.
        drop(supervisor);
        gate.notify_one();
        tokio::time::sleep(Duration::from_millis(50)).await;

        // The worker's weak reference failed to resolve; nothing was delivered.
        assert_eq!(listener.events(), vec![Event::Started]);
    }
}
