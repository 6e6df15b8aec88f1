//! Vellum - versioned, session-locked document store layer
//!
//! Vellum turns a raw, eventually-consistent key-value backend into a
//! versioned document store with session locking, transparent schema
//! migrations, optional validation, and one-way payload freezing.
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use vellum::{Collection, CollectionOptions, DocumentKey, JsonValue, LoadOutcome, MemoryBackend};
//!
//! # fn main() -> vellum::Result<()> {
//! let backend = Arc::new(MemoryBackend::new());
//! let options = CollectionOptions::with_static_default(JsonValue::object());
//! let collection = Collection::new("saves", backend, options)?;
//!
//! let key = DocumentKey::new("player_1")?;
//! match collection.load(&key)? {
//!     LoadOutcome::Acquired(doc) => println!("locked as {}", doc.lock_id()),
//!     LoadOutcome::Cancelled => println!("shutting down"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! The [`Collection`] drives the document-acquisition protocol: a
//! transactional read-modify-write cycle that arbitrates session locks,
//! synthesizes default data for first-time keys, runs the migration chain,
//! validates the result, and decides to retry, fail, or succeed. Backends
//! implement the [`Backend`] trait; an in-memory reference implementation
//! ([`MemoryBackend`]) ships with the crate.

pub use vellum_backend::{
    Backend, CommitRequest, MemoryBackend, ReadMetadata, RetryPolicy, RetryReason, Transform,
    TransformResult, UpdateOutcome,
};
pub use vellum_core::{
    deep_copy, CollectionOptions, DefaultData, DocumentKey, JsonValue, LockId, Migration,
    MigrationChain, Payload, Result, ShutdownSignal, StoredRecord, Timestamp, ValidateFn,
    VellumError, Verdict, MAX_KEY_LENGTH, MAX_NESTING_DEPTH,
};
pub use vellum_engine::{
    Collection, Document, LifecycleHooks, LoadOutcome, NoopHooks, Ownership, ReadSnapshot,
    LOCK_EXPIRE,
};
