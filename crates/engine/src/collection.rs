//! Collection: the public entry point
//!
//! Binds a backend handle, validated configuration, lifecycle hooks, and
//! the injected shutdown signal, and exposes the three operations: `load`
//! (transactional acquisition), `read` (non-transactional fetch), and
//! `remove` (deletion).

use std::sync::Arc;

use tracing::{debug, info, warn};
use vellum_backend::{Backend, ReadMetadata, UpdateOutcome};
use vellum_core::{
    CollectionOptions, DefaultData, DocumentKey, JsonValue, Payload, Result, ShutdownSignal,
    StoredRecord, Timestamp, VellumError,
};

use crate::document::{Document, LifecycleHooks, NoopHooks};
use crate::loader::{self, AttemptContext};
use crate::migration;
use crate::validate;

/// How a `load` call ended when it did not fail
#[derive(Debug)]
pub enum LoadOutcome {
    /// The document was acquired under a fresh session lock
    Acquired(Document),
    /// Shutdown suppressed the result; no handle was handed out
    Cancelled,
}

/// Result of a non-transactional `read`
#[derive(Debug, Clone)]
pub struct ReadSnapshot {
    /// The migrated, validated payload
    pub payload: JsonValue,
    /// Read-side metadata as fetched
    pub metadata: ReadMetadata,
}

/// A named set of documents sharing one configuration
///
/// The collection exclusively owns its backend handle and configuration; it
/// does not own documents — those belong to whichever external lifecycle
/// manager receives them after a successful load. All methods take `&self`;
/// the backend provides the only mutual exclusion required.
pub struct Collection {
    name: String,
    backend: Arc<dyn Backend>,
    options: CollectionOptions,
    hooks: Arc<dyn LifecycleHooks>,
    shutdown: ShutdownSignal,
}

impl std::fmt::Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl Collection {
    /// Create a collection, validating the options fail-fast
    ///
    /// A static default-data template must satisfy the structural depth cap
    /// and the configured validator here; a template that would fail every
    /// first-time load is a configuration bug, caught at construction.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOptions` describing the rejected configuration.
    pub fn new(
        name: impl Into<String>,
        backend: Arc<dyn Backend>,
        options: CollectionOptions,
    ) -> Result<Self> {
        if let DefaultData::Static(template) = &options.default_data {
            template
                .validate_depth()
                .and_then(|()| validate::check(options.validate.as_ref(), template))
                .map_err(|err| VellumError::InvalidOptions {
                    message: format!("static default data rejected: {err}"),
                })?;
        }
        Ok(Self {
            name: name.into(),
            backend,
            options,
            hooks: Arc::new(NoopHooks),
            shutdown: ShutdownSignal::new(),
        })
    }

    /// Attach the external document-lifecycle collaborator
    pub fn with_hooks(mut self, hooks: Arc<dyn LifecycleHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Attach the process-wide shutdown signal
    pub fn with_shutdown_signal(mut self, signal: ShutdownSignal) -> Self {
        self.shutdown = signal;
        self
    }

    /// The collection's name (used for logging only)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The validated configuration
    pub fn options(&self) -> &CollectionOptions {
        &self.options
    }

    /// Acquire the document stored under `key`
    ///
    /// See [`Collection::load_with_owner_ids`]; this variant associates no
    /// owner ids on first-time creation.
    ///
    /// # Errors
    ///
    /// Terminal kinds from the acquisition protocol: default-data,
    /// migration and validation failures, `SessionLocked` once the
    /// backend's retry policy is exhausted, and `Backend` for service
    /// faults.
    pub fn load(&self, key: &DocumentKey) -> Result<LoadOutcome> {
        self.load_inner(key, None)
    }

    /// Acquire the document stored under `key`, associating `owner_ids`
    /// with the record if this load creates it
    ///
    /// # Errors
    ///
    /// Same as [`Collection::load`].
    pub fn load_with_owner_ids(&self, key: &DocumentKey, owner_ids: &[u64]) -> Result<LoadOutcome> {
        self.load_inner(key, Some(owner_ids))
    }

    fn load_inner(&self, key: &DocumentKey, owner_ids: Option<&[u64]>) -> Result<LoadOutcome> {
        if self.shutdown.is_closing() {
            debug!(collection = %self.name, key = %key, "load refused, shutdown in progress");
            return Ok(LoadOutcome::Cancelled);
        }

        self.hooks.register_ongoing_load();

        let ctx = AttemptContext {
            options: &self.options,
            key,
            owner_ids,
        };
        let mut transform = |stored: Option<&StoredRecord>, metadata: &ReadMetadata| {
            loader::attempt(&ctx, stored, metadata, Timestamp::now())
        };

        let settled = self.backend.transactional_update(key, &mut transform);

        let outcome = match settled {
            Ok(outcome) => outcome,
            Err(err) => {
                self.hooks.complete_load(None);
                return Err(err);
            }
        };

        match outcome {
            UpdateOutcome::Cancelled => {
                self.hooks.complete_load(None);
                debug!(collection = %self.name, key = %key, "load cancelled by backend");
                Ok(LoadOutcome::Cancelled)
            }
            UpdateOutcome::Exhausted(reason) => {
                self.hooks.complete_load(None);
                warn!(collection = %self.name, key = %key, "backend retry policy exhausted");
                Err(reason.into_error())
            }
            UpdateOutcome::Committed { record, metadata } => {
                if self.shutdown.is_closing() {
                    // The lock was written, but a handle handed out now
                    // could not be safely autosaved; suppress the result.
                    self.hooks.complete_load(None);
                    debug!(collection = %self.name, key = %key, "load result suppressed by shutdown");
                    return Ok(LoadOutcome::Cancelled);
                }
                let Some(lock_id) = record.lock_owner else {
                    self.hooks.complete_load(None);
                    return Err(VellumError::Backend {
                        message: "committed record is missing its lock owner".to_string(),
                    });
                };
                let payload = Payload::new(record.payload, self.options.freeze_data);
                let document = Document::new(key.clone(), lock_id, payload, metadata);
                self.hooks.complete_load(Some(&document));
                self.hooks.track_open_document(&document);
                info!(
                    collection = %self.name,
                    key = %key,
                    lock = %lock_id,
                    "document acquired"
                );
                Ok(LoadOutcome::Acquired(document))
            }
        }
    }

    /// Fetch the current payload without acquiring or touching the lock
    ///
    /// Bypasses any read cache, runs the migration chain and the validation
    /// gate over the fetched payload, and returns it without writing
    /// anything back. An absent value is a normal non-error result.
    ///
    /// # Errors
    ///
    /// Migration and validation failures, and `Backend` for fetch faults.
    pub fn read(&self, key: &DocumentKey) -> Result<Option<ReadSnapshot>> {
        let Some((record, metadata)) = self.backend.read_current(key)? else {
            debug!(collection = %self.name, key = %key, "read found no document");
            return Ok(None);
        };
        let outcome = migration::run_chain(&self.options.migrations, &record, key)?;
        validate::check(self.options.validate.as_ref(), &outcome.payload)?;
        Ok(Some(ReadSnapshot {
            payload: outcome.payload,
            metadata,
        }))
    }

    /// Delete the record stored under `key`
    ///
    /// Does not coordinate with any currently open handle for the key; an
    /// in-flight handle's later save for the same key fails once the record
    /// is gone.
    ///
    /// # Errors
    ///
    /// Returns `Backend` if the deletion fails.
    pub fn remove(&self, key: &DocumentKey) -> Result<()> {
        debug!(collection = %self.name, key = %key, "removing document");
        self.backend.delete(key)
    }
}
