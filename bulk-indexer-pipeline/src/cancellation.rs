//! Cooperative, one-shot stop flag shared by every pipeline participant.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Handle to the stop flag of a workgroup.
///
/// Clones share the same flag. Once raised the flag stays raised; nothing
/// in the pipeline ever lowers it.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    flag: Arc<AtomicBool>,
}

impl StopHandle {
    /// Create a new, lowered flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag.
    ///
    /// Returns `true` only for the call that actually raised it; later calls
    /// are no-ops.
    pub fn request_stop(&self) -> bool {
        !self.flag.swap(true, Ordering::SeqCst)
    }

    /// Whether a stop has been requested.
    pub fn should_stop(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
