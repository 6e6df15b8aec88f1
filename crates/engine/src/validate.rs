//! Validation gate
//!
//! Wraps the user-supplied validator predicate, normalizing its three
//! outcomes (pass, explicit failure, internal fault) into the single error
//! channel. Used by both the write path and the read path. The gate never
//! mutates the value it checks.

use vellum_core::{JsonValue, Result, ValidateFn, VellumError, Verdict};

/// Run the configured validator over a payload
///
/// No validator configured means everything passes.
///
/// # Errors
///
/// - `ValidateFailed` when the validator explicitly rejects the payload
/// - `ValidateThrew` when the validator itself faults
pub fn check(validator: Option<&ValidateFn>, value: &JsonValue) -> Result<()> {
    let Some(validator) = validator else {
        return Ok(());
    };
    match validator(value) {
        Ok(Verdict::Pass) => Ok(()),
        Ok(Verdict::Fail(message)) => Err(VellumError::ValidateFailed { message }),
        Err(message) => Err(VellumError::ValidateThrew { message }),
    }
}
