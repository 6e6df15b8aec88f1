//! Document handle and lifecycle collaborator hooks
//!
//! A `Document` is the caller-visible product of a successful, session-
//! locked load. Its save/close/autosave lifecycle is owned by an external
//! collaborator; this module only defines the handle itself and the hooks
//! the loader invokes around it.

use vellum_backend::ReadMetadata;
use vellum_core::{DocumentKey, JsonValue, LockId, Payload};

/// Caller-visible handle to a successfully loaded, session-locked record
///
/// Owned exclusively by the process that won the load race. When the
/// collection freezes data the payload is immutable and `payload_mut`
/// returns `None`.
#[derive(Debug, Clone)]
pub struct Document {
    key: DocumentKey,
    lock_id: LockId,
    payload: Payload,
    metadata: ReadMetadata,
}

impl Document {
    pub(crate) fn new(
        key: DocumentKey,
        lock_id: LockId,
        payload: Payload,
        metadata: ReadMetadata,
    ) -> Self {
        Self {
            key,
            lock_id,
            payload,
            metadata,
        }
    }

    /// The key this document was loaded under
    pub fn key(&self) -> &DocumentKey {
        &self.key
    }

    /// The session-lock identifier this handle holds
    pub fn lock_id(&self) -> LockId {
        self.lock_id
    }

    /// Read access to the payload
    pub fn payload(&self) -> &JsonValue {
        self.payload.value()
    }

    /// Mutable access to the payload; `None` once frozen
    pub fn payload_mut(&mut self) -> Option<&mut JsonValue> {
        self.payload.value_mut()
    }

    /// Whether the payload was frozen at load time
    pub fn is_frozen(&self) -> bool {
        self.payload.is_frozen()
    }

    /// Metadata snapshot taken when the load committed
    pub fn metadata(&self) -> &ReadMetadata {
        &self.metadata
    }
}

/// Hooks the loader invokes around every load
///
/// Implemented by the external document-lifecycle collaborator (autosave,
/// open-handle tracking, shutdown draining). `register_ongoing_load` and
/// `complete_load` bracket every `load` call, whatever its outcome;
/// `track_open_document` fires only after a successful, non-shutdown
/// completion.
pub trait LifecycleHooks: Send + Sync {
    /// A load is starting
    fn register_ongoing_load(&self) {}

    /// The load settled; `handle` is present only when a document was
    /// produced and not suppressed by shutdown
    fn complete_load(&self, _handle: Option<&Document>) {}

    /// A document handle was handed to the caller
    fn track_open_document(&self, _handle: &Document) {}
}

/// Hooks implementation that does nothing
///
/// Used when no lifecycle collaborator is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHooks;

impl LifecycleHooks for NoopHooks {}
