//! The observer contract between a background run and the current task owner.

use async_trait::async_trait;

/// Notification interface a task owner implements to observe a run.
///
/// This is the complete notification surface: a run begins and a run finishes
/// with a result. `on_task_started` also fires when a new owner attaches while
/// the run is still in flight, so a recreated owner can reflect current state
/// (show its progress indicator again). `on_task_finished` fires exactly once
/// per run — either directly at completion, or on the next attach if the
/// result was buffered while nobody was listening.
///
/// Callbacks are invoked outside the supervisor's internal lock, so a listener
/// may call back into its supervisor (for example, detaching itself once the
/// result arrives) from inside a callback.
#[async_trait]
pub trait TaskListener: Send + Sync {
    /// The run has begun, or is still in flight at attach time.
    async fn on_task_started(&self);

    /// The run produced its result.
    async fn on_task_finished(&self, result: String);
}
