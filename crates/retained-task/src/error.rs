//! Unified error type for task lifecycle operations.

use crate::state_machine::TaskPhase;

/// Unified error type for task lifecycle operations.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Invalid phase transition: {current:?} -> {requested:?}")]
    InvalidTransition {
        current: TaskPhase,
        requested: TaskPhase,
    },

    #[error("Task is in terminal phase: {0:?}")]
    TerminalPhase(TaskPhase),

    #[error("Maximum tasks limit reached: {0}")]
    MaxTasksReached(usize),
}
