//! Stored record model
//!
//! The on-backend representation of one document. Backends decide how to
//! encode it; this layer only fixes the shape and its invariants.

use crate::json::JsonValue;
use crate::types::LockId;
use serde::{Deserialize, Serialize};

/// The on-backend representation of one document
///
/// ## Invariants
///
/// - `last_compatible_version <= schema_version` always
/// - `schema_version` never decreases across successful writes for a key
/// - A record with `lock_owner` present and a last-write time inside the
///   lock-expiry window is *owned*; outside the window it is *stale* and
///   eligible for takeover
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    /// Index of the last migration applied
    pub schema_version: u32,
    /// Oldest schema version that can still read this record without
    /// migration; monotonic non-decreasing across writes
    pub last_compatible_version: u32,
    /// Identifier of the session currently holding the lock; `None` means
    /// unlocked
    pub lock_owner: Option<LockId>,
    /// The document's actual data
    pub payload: JsonValue,
}

impl StoredRecord {
    /// Build a record, clamping `last_compatible_version` to the schema
    /// version so the invariant holds by construction
    pub fn new(
        schema_version: u32,
        last_compatible_version: u32,
        lock_owner: Option<LockId>,
        payload: JsonValue,
    ) -> Self {
        Self {
            schema_version,
            last_compatible_version: last_compatible_version.min(schema_version),
            lock_owner,
            payload,
        }
    }

    /// Whether a session-lock identifier is recorded
    ///
    /// Liveness of that lock is a separate question answered by the arbiter
    /// against the last-write timestamp.
    pub fn has_lock_owner(&self) -> bool {
        self.lock_owner.is_some()
    }
}
