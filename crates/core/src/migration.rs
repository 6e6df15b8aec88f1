//! Migration chain representation
//!
//! Migrations form a linear chain: the entry at index N upgrades a payload
//! from schema version N to N+1, and the chain length defines the current
//! schema version. Each entry must be **deterministic and pure**; two
//! processes migrating the same stored payload must produce identical
//! results.
//!
//! A migration is either a bare transform or a transform plus a declared
//! compatibility marker. Both forms normalize into the single tagged
//! representation below at configuration time, never at use time.

use crate::json::JsonValue;
use std::fmt;
use std::sync::Arc;

/// Transform function applied by one migration step
///
/// Receives the payload produced by the previous step (or the stored payload
/// for the first applied step). An `Err` aborts the whole chain, carrying
/// the message.
pub type MigrateFn = Arc<dyn Fn(JsonValue) -> std::result::Result<JsonValue, String> + Send + Sync>;

/// One normalized migration step
#[derive(Clone)]
pub struct Migration {
    transform: MigrateFn,
    compatible_version: Option<u32>,
}

impl Migration {
    /// Create a migration from a bare transform
    pub fn new<F>(transform: F) -> Self
    where
        F: Fn(JsonValue) -> std::result::Result<JsonValue, String> + Send + Sync + 'static,
    {
        Self {
            transform: Arc::new(transform),
            compatible_version: None,
        }
    }

    /// Declare the oldest schema version still able to read the output of
    /// this step without migration
    pub fn with_compatible_version(mut self, version: u32) -> Self {
        self.compatible_version = Some(version);
        self
    }

    /// Apply the transform to a payload
    pub fn apply(&self, payload: JsonValue) -> std::result::Result<JsonValue, String> {
        (self.transform)(payload)
    }

    /// The declared compatibility marker, if any
    pub fn compatible_version(&self) -> Option<u32> {
        self.compatible_version
    }
}

impl fmt::Debug for Migration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Migration")
            .field("compatible_version", &self.compatible_version)
            .finish_non_exhaustive()
    }
}

/// Ordered chain of migrations
///
/// The chain length defines the current schema version.
#[derive(Debug, Clone, Default)]
pub struct MigrationChain(Vec<Migration>);

impl MigrationChain {
    /// Create an empty chain (current schema version 0)
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Append a migration to the chain
    pub fn push(mut self, migration: Migration) -> Self {
        self.0.push(migration);
        self
    }

    /// Number of migrations in the chain
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the chain is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The schema version this chain upgrades records to
    pub fn current_version(&self) -> u32 {
        self.0.len() as u32
    }

    /// Iterate over the chain in application order
    pub fn iter(&self) -> impl Iterator<Item = &Migration> {
        self.0.iter()
    }

    /// The migrations in the half-open index range `[from, to)`
    ///
    /// Used by the engine to select the applied range starting at a stored
    /// record's schema version.
    pub fn slice(&self, from: usize, to: usize) -> &[Migration] {
        &self.0[from.min(self.0.len())..to.min(self.0.len())]
    }
}

impl FromIterator<Migration> for MigrationChain {
    fn from_iter<T: IntoIterator<Item = Migration>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bare_transform_has_no_marker() {
        let m = Migration::new(Ok);
        assert_eq!(m.compatible_version(), None);
    }

    #[test]
    fn test_with_compatible_version() {
        let m = Migration::new(Ok).with_compatible_version(2);
        assert_eq!(m.compatible_version(), Some(2));
    }

    #[test]
    fn test_apply_transform() {
        let m = Migration::new(|mut v: JsonValue| {
            v["coins"] = json!(0);
            Ok(v)
        });
        let out = m.apply(JsonValue::object()).unwrap();
        assert_eq!(out.as_inner()["coins"], json!(0));
    }

    #[test]
    fn test_apply_propagates_error() {
        let m = Migration::new(|_| Err("bad shape".to_string()));
        assert_eq!(m.apply(JsonValue::object()).unwrap_err(), "bad shape");
    }

    #[test]
    fn test_chain_current_version_is_length() {
        let chain = MigrationChain::new()
            .push(Migration::new(Ok))
            .push(Migration::new(Ok));
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.current_version(), 2);
        assert!(!chain.is_empty());
    }

    #[test]
    fn test_empty_chain() {
        let chain = MigrationChain::new();
        assert_eq!(chain.current_version(), 0);
        assert!(chain.is_empty());
    }

    #[test]
    fn test_slice_clamps_bounds() {
        let chain: MigrationChain = (0..3).map(|_| Migration::new(Ok)).collect();
        assert_eq!(chain.slice(1, 3).len(), 2);
        assert_eq!(chain.slice(5, 9).len(), 0);
        assert_eq!(chain.slice(0, 99).len(), 3);
    }
}
