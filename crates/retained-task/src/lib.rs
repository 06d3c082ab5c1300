//! # Retained Background Tasks
//!
//! **Background work that outlives the object observing it.**
//!
//! A transient *task owner* (think: a screen that is torn down and rebuilt on
//! every rotation) starts a long-running unit of work and wants to see its
//! result — but may not exist at the moment the result arrives. This crate
//! packages the idiom that makes that safe:
//!
//! - a [`TaskSupervisor`] that outlives any single owner instance and holds
//!   the observer slot plus a one-slot result buffer,
//! - a background runner that references the supervisor only *weakly*, so a
//!   supervisor torn down for good is never kept alive by its own work,
//! - buffered delivery: a result that completes while no observer is attached
//!   waits in a [`ResultSlot`] and is handed to the next observer on attach.
//!
//! ## Quick Start
//!
//! ```rust
//! use retained_task::prelude::*;
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), TaskError> {
//! let registry = TaskRegistry::new();
//! let (task_id, supervisor) = registry.register().await?;
//!
//! // The first owner instance kicks off the work.
//! supervisor.start(simulated_work(3, Duration::from_millis(1))).await?;
//!
//! // The owner is destroyed mid-run; the work keeps going.
//! supervisor.detach().await;
//!
//! // A recreated owner finds the same task by ID and picks it back up.
//! let supervisor = registry.get(&task_id).await.expect("task still registered");
//! supervisor.await_finished().await;
//! assert!(supervisor.has_buffered_result().await);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - **`TaskListener` trait**: the two-notification observer contract
//!   (`on_task_started`, `on_task_finished`)
//! - **`TaskSupervisor`**: owner-side coordination — attach/detach, buffered
//!   delivery, the single `start()` entry point
//! - **`TaskRegistry`**: stable task identity independent of any owner
//! - **State machine**: `NotStarted -> Running -> Finished`, enforced on
//!   every `start()`

pub mod buffer;
pub mod cancellation;
pub mod error;
pub mod listener;
pub mod prelude;
pub mod registry;
pub mod runner;
pub mod state_machine;
pub mod supervisor;

// Re-exports for convenience
pub use buffer::ResultSlot;
pub use cancellation::CancellationHandle;
pub use error::TaskError;
pub use listener::TaskListener;
pub use registry::{TaskRegistry, TaskRegistryConfig};
pub use runner::{BoxedTaskWork, TaskRunner, simulated_work};
pub use state_machine::{TaskPhase, is_terminal, validate_transition};
pub use supervisor::TaskSupervisor;
