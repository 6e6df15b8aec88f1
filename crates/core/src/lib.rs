//! Core types and traits for Vellum
//!
//! This crate defines the foundational types used throughout the system:
//! - DocumentKey / LockId: identifier newtypes
//! - Timestamp: microsecond-precision time
//! - JsonValue / Payload: the document payload model with one-way freezing
//! - StoredRecord: the on-backend representation of one document
//! - Migration / MigrationChain: normalized schema migrations
//! - CollectionOptions: configuration surface
//! - VellumError: error hierarchy
//! - ShutdownSignal: injected process-shutdown flag

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod json;
pub mod migration;
pub mod record;
pub mod shutdown;
pub mod timestamp;
pub mod types;

// Re-export commonly used types at the crate root
pub use config::{CollectionOptions, DefaultData, DefaultDataFn, ValidateFn, Verdict};
pub use error::{Result, VellumError};
pub use json::{deep_copy, JsonValue, Payload, MAX_NESTING_DEPTH};
pub use migration::{MigrateFn, Migration, MigrationChain};
pub use record::StoredRecord;
pub use shutdown::ShutdownSignal;
pub use timestamp::Timestamp;
pub use types::{DocumentKey, LockId, MAX_KEY_LENGTH};
