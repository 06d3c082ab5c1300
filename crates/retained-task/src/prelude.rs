//! Prelude module for convenient imports.
//!
//! ```rust,no_run
//! use retained_task::prelude::*;
//! ```

pub use crate::buffer::ResultSlot;
pub use crate::cancellation::CancellationHandle;
pub use crate::error::TaskError;
pub use crate::listener::TaskListener;
pub use crate::registry::{TaskRegistry, TaskRegistryConfig};
pub use crate::runner::{BoxedTaskWork, TaskRunner, simulated_work};
pub use crate::state_machine::{TaskPhase, is_terminal, validate_transition};
pub use crate::supervisor::TaskSupervisor;
