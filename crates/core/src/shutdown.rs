//! Process shutdown signal
//!
//! An explicitly injected, observable flag standing in for ambient
//! process-wide shutdown state. Collections consult it at call entry and
//! again after the backend settles; backends may consult it mid-exchange.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared shutdown flag
///
/// Cloning yields another handle to the same flag. Once `begin()` has been
/// called the flag stays set; there is no way to clear it.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal(Arc<AtomicBool>);

impl ShutdownSignal {
    /// Create a signal in the not-closing state
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the process as closing
    pub fn begin(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether shutdown has begun
    pub fn is_closing(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
