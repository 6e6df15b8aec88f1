//! Collection configuration surface
//!
//! Recognized options: default data (static template or per-key generator),
//! a validator predicate, the migration chain, and whether payloads are
//! frozen before handles are handed out. Options are plain data here; the
//! engine's collection constructor runs the fail-fast checks.

use crate::json::JsonValue;
use crate::migration::MigrationChain;
use crate::types::DocumentKey;
use std::fmt;
use std::sync::Arc;

/// Per-key default data generator
///
/// Invoked with the key on first-time creation. An `Err` is surfaced as
/// `DefaultDataThrew` with the carried message.
pub type DefaultDataFn =
    Arc<dyn Fn(&DocumentKey) -> std::result::Result<JsonValue, String> + Send + Sync>;

/// Source of initial data for a key never seen before
#[derive(Clone)]
pub enum DefaultData {
    /// A static template, validated once at collection construction
    Static(JsonValue),
    /// A per-key generator, validated per invocation
    Generated(DefaultDataFn),
}

impl fmt::Debug for DefaultData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultData::Static(v) => f.debug_tuple("Static").field(v).finish(),
            DefaultData::Generated(_) => f.write_str("Generated(..)"),
        }
    }
}

/// Outcome a validator reports for a payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The payload is acceptable
    Pass,
    /// The payload is rejected, with an optional message
    Fail(Option<String>),
}

/// Validator predicate over a payload
///
/// The three outcomes are kept distinct: `Ok(Pass)`, `Ok(Fail(..))`
/// (explicit invalidity), and `Err(..)` (a fault inside the validator
/// itself). The gate normalizes them into the error channel. Validators
/// must never mutate the payload; they only see a shared reference.
pub type ValidateFn =
    Arc<dyn Fn(&JsonValue) -> std::result::Result<Verdict, String> + Send + Sync>;

/// Configuration for one collection
#[derive(Clone)]
pub struct CollectionOptions {
    /// Initial data for first-time keys
    pub default_data: DefaultData,
    /// Optional payload validator
    pub validate: Option<ValidateFn>,
    /// Ordered migration chain; its length is the current schema version
    pub migrations: MigrationChain,
    /// Freeze payloads before handing out document handles (default true)
    pub freeze_data: bool,
}

impl CollectionOptions {
    /// Options with a static default-data template
    pub fn with_static_default(template: JsonValue) -> Self {
        Self {
            default_data: DefaultData::Static(template),
            validate: None,
            migrations: MigrationChain::new(),
            freeze_data: true,
        }
    }

    /// Options with a per-key default-data generator
    pub fn with_generated_default<F>(generator: F) -> Self
    where
        F: Fn(&DocumentKey) -> std::result::Result<JsonValue, String> + Send + Sync + 'static,
    {
        Self {
            default_data: DefaultData::Generated(Arc::new(generator)),
            validate: None,
            migrations: MigrationChain::new(),
            freeze_data: true,
        }
    }

    /// Set the validator predicate
    pub fn validator<F>(mut self, validate: F) -> Self
    where
        F: Fn(&JsonValue) -> std::result::Result<Verdict, String> + Send + Sync + 'static,
    {
        self.validate = Some(Arc::new(validate));
        self
    }

    /// Set the migration chain
    pub fn migrations(mut self, chain: MigrationChain) -> Self {
        self.migrations = chain;
        self
    }

    /// Control payload freezing (default true)
    pub fn freeze_data(mut self, freeze: bool) -> Self {
        self.freeze_data = freeze;
        self
    }
}

impl fmt::Debug for CollectionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionOptions")
            .field("default_data", &self.default_data)
            .field("has_validator", &self.validate.is_some())
            .field("migrations", &self.migrations.len())
            .field("freeze_data", &self.freeze_data)
            .finish()
    }
}
