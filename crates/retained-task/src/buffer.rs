//! Single-slot mailbox for a result produced while no observer is attached.

use tracing::warn;

/// One-slot holding area for a task result.
///
/// Written only when a run completes with no listener attached; read and
/// cleared exactly once on the next attach. Holds at most one value.
#[derive(Debug, Default)]
pub struct ResultSlot {
    value: Option<String>,
}

impl ResultSlot {
    /// Create an empty slot.
    pub fn new() -> Self {
        Self { value: None }
    }

    /// Store a result.
    ///
    /// Under the run-once invariant the slot is always empty here; finding it
    /// occupied indicates a lifecycle bug, so the newer value wins and the
    /// collision is logged.
    pub fn put(&mut self, value: String) {
        if self.value.is_some() {
            warn!("result slot already occupied, replacing buffered value");
        }
        self.value = Some(value);
    }

    /// Read and clear the buffered result.
    pub fn take(&mut self) -> Option<String> {
        self.value.take()
    }

    /// Returns `true` if no result is buffered.
    pub fn is_empty(&self) -> bool {
        self.value.is_none()
    }
}
