//! Runner phase state machine enforcement.
//!
//! Validates transitions over the run-once lifecycle:
//!
//! ```text
//! NotStarted -> Running
//! Running    -> Finished
//! Finished   -> ERROR (terminal, no further transitions)
//! ```

use crate::error::TaskError;

/// Phase of a background run.
///
/// A runner moves through each phase exactly once; there is no path back and
/// no restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskPhase {
    /// No work has been started yet
    NotStarted,
    /// The background work is in flight
    Running,
    /// The work completed or was cancelled (terminal)
    Finished,
}

/// Validate a phase transition per the run-once lifecycle rules.
///
/// Returns `Ok(())` if the transition is valid, or `Err(TaskError)` if not.
pub fn validate_transition(from: TaskPhase, to: TaskPhase) -> Result<(), TaskError> {
    match from {
        TaskPhase::NotStarted => match to {
            TaskPhase::Running => Ok(()),
            TaskPhase::NotStarted | TaskPhase::Finished => Err(TaskError::InvalidTransition {
                current: from,
                requested: to,
            }),
        },
        TaskPhase::Running => match to {
            TaskPhase::Finished => Ok(()),
            TaskPhase::NotStarted | TaskPhase::Running => Err(TaskError::InvalidTransition {
                current: from,
                requested: to,
            }),
        },
        TaskPhase::Finished => Err(TaskError::TerminalPhase(from)),
    }
}

/// Returns `true` if the phase is terminal (no further transitions allowed).
pub fn is_terminal(phase: TaskPhase) -> bool {
    matches!(phase, TaskPhase::Finished)
}
