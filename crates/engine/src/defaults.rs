//! Default data factory
//!
//! Produces the initial payload for a key never seen before, either from a
//! static template or a per-key generator, then runs it through the
//! validation gate.

use crate::validate;
use vellum_core::{deep_copy, CollectionOptions, DefaultData, DocumentKey, JsonValue, Result, VellumError};

/// Build the initial payload for a first-time key
///
/// Generator output is validated here. Static templates were validated once
/// at collection construction and are reused directly: deep-copied per
/// invocation, or shared as-is when the collection freezes data (the single
/// instance ends up frozen, so no caller can mutate it).
///
/// # Errors
///
/// - `DefaultDataThrew` when the generator faults
/// - `ValidateFailed` / `ValidateThrew` from the gate over generator output
/// - `DepthExceeded` when deep-copying an over-deep template
pub fn make_default(options: &CollectionOptions, key: &DocumentKey) -> Result<JsonValue> {
    match &options.default_data {
        DefaultData::Generated(generator) => {
            let value = generator(key).map_err(|message| VellumError::DefaultDataThrew { message })?;
            validate::check(options.validate.as_ref(), &value)?;
            Ok(value)
        }
        DefaultData::Static(template) => {
            if options.freeze_data {
                Ok(template.clone())
            } else {
                deep_copy(template)
            }
        }
    }
}
