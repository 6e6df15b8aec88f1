//! Error types for the Vellum document store
//!
//! This module defines all error kinds used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Validation and migration faults are terminal for the call that produced
//! them: they indicate a data or configuration problem, not transient
//! contention. `SessionLocked` is the only condition that triggers logical
//! retry, and retry exhaustion is owned by the backend, not this layer.

use crate::types::LockId;
use thiserror::Error;

/// Result type alias for Vellum operations
pub type Result<T> = std::result::Result<T, VellumError>;

/// Error kinds for the Vellum document store
#[derive(Debug, Error, Clone, PartialEq)]
pub enum VellumError {
    /// The per-key default data generator faulted
    #[error("default data generator failed: {message}")]
    DefaultDataThrew {
        /// Message carried from the generator fault
        message: String,
    },

    /// The validator itself faulted while checking a payload
    #[error("validator raised an internal error: {message}")]
    ValidateThrew {
        /// Message carried from the validator fault
        message: String,
    },

    /// The validator explicitly rejected a payload
    #[error("payload failed validation: {}", message.as_deref().unwrap_or("no message"))]
    ValidateFailed {
        /// Optional message supplied by the validator
        message: Option<String>,
    },

    /// A migration step aborted the chain
    #[error("migration step {step} failed: {message}")]
    Migration {
        /// Index of the failing step in the chain
        step: u32,
        /// Original error message from the step
        message: String,
    },

    /// The document is owned by another live session
    ///
    /// This is a logical-retry reason; it only surfaces to callers when the
    /// backend's own retry policy gives up.
    #[error("document is session-locked by {holder}")]
    SessionLocked {
        /// Lock identifier of the current holder
        holder: LockId,
    },

    /// A backend-surfaced fault (network, quota, permission, encoding)
    #[error("backend failure: {message}")]
    Backend {
        /// Underlying message from the backend
        message: String,
    },

    /// Collection options failed fail-fast validation at construction
    #[error("invalid collection options: {message}")]
    InvalidOptions {
        /// What was wrong with the configuration
        message: String,
    },

    /// A document key failed structural validation
    #[error("invalid document key: {message}")]
    InvalidKey {
        /// What was wrong with the key
        message: String,
    },

    /// A payload exceeds the structural nesting limit
    ///
    /// The document model assumes tree-shaped data; depth beyond the cap is
    /// treated as a configuration error rather than recursed into.
    #[error("nesting depth {depth} exceeds maximum of {max} levels")]
    DepthExceeded {
        /// Observed nesting depth
        depth: usize,
        /// Maximum allowed depth
        max: usize,
    },
}

impl VellumError {
    /// True for the kinds that terminate a `load`/`read` call outright
    ///
    /// Everything except `SessionLocked`, which is a retry reason first and
    /// only becomes caller-visible on retry exhaustion.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, VellumError::SessionLocked { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_default_data_threw() {
        let err = VellumError::DefaultDataThrew {
            message: "generator panicked on key".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("default data generator failed"));
        assert!(msg.contains("generator panicked on key"));
    }

    #[test]
    fn test_error_display_validate_threw() {
        let err = VellumError::ValidateThrew {
            message: "index out of bounds".to_string(),
        };
        assert!(err.to_string().contains("internal error"));
        assert!(err.to_string().contains("index out of bounds"));
    }

    #[test]
    fn test_error_display_validate_failed_with_message() {
        let err = VellumError::ValidateFailed {
            message: Some("coins must be non-negative".to_string()),
        };
        assert!(err.to_string().contains("coins must be non-negative"));
    }

    #[test]
    fn test_error_display_validate_failed_without_message() {
        let err = VellumError::ValidateFailed { message: None };
        assert!(err.to_string().contains("no message"));
    }

    #[test]
    fn test_error_display_migration() {
        let err = VellumError::Migration {
            step: 3,
            message: "missing field".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("migration step 3"));
        assert!(msg.contains("missing field"));
    }

    #[test]
    fn test_error_display_session_locked() {
        let holder = LockId::new();
        let err = VellumError::SessionLocked { holder };
        assert!(err.to_string().contains("session-locked"));
        assert!(err.to_string().contains(&holder.to_string()));
    }

    #[test]
    fn test_error_display_backend() {
        let err = VellumError::Backend {
            message: "quota exceeded".to_string(),
        };
        assert!(err.to_string().contains("backend failure"));
        assert!(err.to_string().contains("quota exceeded"));
    }

    #[test]
    fn test_error_display_depth_exceeded() {
        let err = VellumError::DepthExceeded { depth: 130, max: 100 };
        let msg = err.to_string();
        assert!(msg.contains("130"));
        assert!(msg.contains("100"));
    }

    #[test]
    fn test_terminality() {
        assert!(VellumError::ValidateFailed { message: None }.is_terminal());
        assert!(VellumError::Migration {
            step: 0,
            message: "x".into()
        }
        .is_terminal());
        assert!(!VellumError::SessionLocked { holder: LockId::new() }.is_terminal());
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_result() -> Result<i32> {
            Ok(42)
        }

        assert_eq!(returns_result().unwrap(), 42);
    }
}
