//! Backend abstraction for the document store
//!
//! This module defines the Backend trait that enables swapping the
//! underlying key-value service without breaking upper layers. The
//! transactional primitive hands the caller's transform the current stored
//! record (or nothing) plus read-side metadata, and the transform answers
//! with an explicit tri-state result: commit, fail, or retry.
//!
//! The backend is the sole arbiter of true atomicity. It may re-invoke the
//! transform for the same logical attempt (optimistic retry on write
//! conflicts), so transforms must be safe under repetition.

use std::collections::BTreeMap;

use vellum_core::{DocumentKey, JsonValue, LockId, Result, StoredRecord, Timestamp, VellumError};

/// Read-side metadata the backend reports alongside a stored record
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ReadMetadata {
    /// When the record was last written
    pub last_write: Timestamp,
    /// Owner identifiers associated with the record
    pub owner_ids: Vec<u64>,
    /// Free-form attached key/value metadata
    pub attached: BTreeMap<String, JsonValue>,
}

impl Default for ReadMetadata {
    fn default() -> Self {
        Self {
            last_write: Timestamp::EPOCH,
            owner_ids: Vec::new(),
            attached: BTreeMap::new(),
        }
    }
}

/// Reason a transform asks the backend to retry the exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryReason {
    /// The document is owned by another live session
    SessionLocked {
        /// Lock identifier of the current holder
        holder: LockId,
    },
}

impl RetryReason {
    /// Convert the retry reason into the caller-visible error used when the
    /// backend's retry policy is exhausted
    pub fn into_error(self) -> VellumError {
        match self {
            RetryReason::SessionLocked { holder } => VellumError::SessionLocked { holder },
        }
    }
}

/// What a transform asks the backend to commit
#[derive(Debug, Clone, PartialEq)]
pub struct CommitRequest {
    /// The record to store
    pub record: StoredRecord,
    /// Owner identifiers to associate with the record (first-time creation)
    pub add_owner_ids: Option<Vec<u64>>,
    /// Metadata entries to attach or overwrite
    pub attach_metadata: Option<BTreeMap<String, JsonValue>>,
}

impl CommitRequest {
    /// A commit carrying only the record, leaving owner ids and attached
    /// metadata as they are
    pub fn record_only(record: StoredRecord) -> Self {
        Self {
            record,
            add_owner_ids: None,
            attach_metadata: None,
        }
    }
}

/// Tri-state answer a transform gives the backend
///
/// Modeled as an explicit result type rather than exceptions so the
/// transform stays a pure function of its inputs.
#[derive(Debug)]
pub enum TransformResult {
    /// Commit the supplied record
    Commit(CommitRequest),
    /// Abort the exchange with a terminal error
    Fail(VellumError),
    /// Ask the backend to retry per its own policy
    Retry(RetryReason),
}

/// Outcome of a settled transactional update
#[derive(Debug)]
pub enum UpdateOutcome {
    /// The transform's commit was durably applied
    Committed {
        /// The record as committed
        record: StoredRecord,
        /// Fresh metadata after the write
        metadata: ReadMetadata,
    },
    /// The backend's retry policy gave up while the transform kept asking
    /// for retry
    Exhausted(RetryReason),
    /// An external shutdown aborted the exchange
    Cancelled,
}

/// Transform callback invoked by the backend with the current stored state
///
/// May be invoked repeatedly for one logical update; it must not rely on
/// in-memory state carried from one invocation to the next.
pub type Transform<'a> =
    &'a mut (dyn FnMut(Option<&StoredRecord>, &ReadMetadata) -> TransformResult + 'a);

/// Backend abstraction over an eventually-consistent key-value service
///
/// Thread safety: all methods must be safe to call concurrently from
/// multiple threads (requires Send + Sync). The backend provides the only
/// mutual exclusion this layer relies on.
pub trait Backend: Send + Sync {
    /// Run a transactional read-modify-write exchange for `key`
    ///
    /// The backend reads the current record, invokes `transform`, and
    /// commits on `Commit` if no concurrent write was observed since the
    /// read (re-invoking the transform with the fresher value otherwise).
    /// On `Retry` it re-runs the exchange per its own policy; on `Fail` the
    /// carried error is surfaced terminally.
    ///
    /// # Errors
    ///
    /// Returns the transform's `Fail` error, or `Backend` for faults of the
    /// service itself (network, quota, encoding).
    fn transactional_update(
        &self,
        key: &DocumentKey,
        transform: Transform<'_>,
    ) -> Result<UpdateOutcome>;

    /// Fetch the current record without writing anything back
    ///
    /// Must bypass any read cache: stale reads here would poison
    /// session-lock decisions made elsewhere.
    ///
    /// # Errors
    ///
    /// Returns `Backend` if the fetch fails.
    fn read_current(&self, key: &DocumentKey) -> Result<Option<(StoredRecord, ReadMetadata)>>;

    /// Delete the record stored under `key`
    ///
    /// # Errors
    ///
    /// Returns `Backend` if the deletion fails.
    fn delete(&self, key: &DocumentKey) -> Result<()>;
}
