//! In-memory reference backend
//!
//! This module implements the Backend trait using:
//! - `BTreeMap<DocumentKey, StoredEntry>` for ordered key storage
//! - `parking_lot::RwLock` for thread-safe access
//! - `AtomicU64` for monotonically increasing write versions
//! - MessagePack (rmp-serde) for record encoding
//!
//! # Design Notes
//!
//! - **No version history**: each key stores only its latest record
//! - **Compare-and-swap commits**: the transform runs outside the write
//!   lock; a concurrent write observed at commit time re-runs the transform
//!   with the fresher value, exactly like a remote backend's optimistic
//!   retry
//! - **Logical retries are bounded**: a real service backs off and retries
//!   `Retry` answers per its own policy; this backend retries immediately
//!   and gives up after `RetryPolicy::max_attempts`, so exhaustion is
//!   observable in tests
//! - **Cache-bypassing reads**: reads go straight to the committed map;
//!   there is no cache to bypass

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::{debug, warn};

use vellum_core::{DocumentKey, Result, ShutdownSignal, StoredRecord, Timestamp, VellumError};

use crate::traits::{Backend, ReadMetadata, Transform, TransformResult, UpdateOutcome};

/// Logical-retry budget for `Retry` answers from the transform
///
/// Write-conflict retries (compare-and-swap misses) are not counted; they
/// always observe fresh state and therefore make progress.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// How many `Retry` answers to honor before reporting exhaustion
    pub max_attempts: usize,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 8 }
    }
}

/// One stored entry: encoded record plus write bookkeeping
#[derive(Debug, Clone)]
struct StoredEntry {
    /// MessagePack-encoded StoredRecord
    bytes: Vec<u8>,
    /// Version assigned at commit; used for conflict detection
    version: u64,
    /// Read-side metadata reported alongside the record
    metadata: ReadMetadata,
}

/// In-memory backend over an ordered map
///
/// Thread-safe through `parking_lot::RwLock` and `AtomicU64`. Used by the
/// test suites and by embedders that want a local, non-durable store.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    /// The main data store
    entries: RwLock<BTreeMap<DocumentKey, StoredEntry>>,
    /// Global version counter for monotonically increasing write versions
    version: AtomicU64,
    /// Budget for logical retries
    retry_policy: RetryPolicy,
    /// Optional shutdown flag consulted between exchanges
    shutdown: Option<ShutdownSignal>,
}

impl MemoryBackend {
    /// Create an empty backend with the default retry policy
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the logical-retry budget
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Attach a shutdown signal; exchanges observed after `begin()` report
    /// `Cancelled`
    pub fn with_shutdown_signal(mut self, signal: ShutdownSignal) -> Self {
        self.shutdown = Some(signal);
        self
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the backend holds no records
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn encode(record: &StoredRecord) -> Result<Vec<u8>> {
        rmp_serde::to_vec(record).map_err(|e| VellumError::Backend {
            message: e.to_string(),
        })
    }

    fn decode(bytes: &[u8]) -> Result<StoredRecord> {
        rmp_serde::from_slice(bytes).map_err(|e| VellumError::Backend {
            message: e.to_string(),
        })
    }

    fn is_closing(&self) -> bool {
        self.shutdown.as_ref().is_some_and(ShutdownSignal::is_closing)
    }

    // ========================================================================
    // Test support
    // ========================================================================

    /// Place a record directly, bypassing the transactional path
    ///
    /// Test support: lets suites stage arbitrary stored states (old schema
    /// versions, foreign lock owners) before exercising the loader.
    pub fn seed(&self, key: &DocumentKey, record: &StoredRecord, metadata: ReadMetadata) -> Result<()> {
        let bytes = Self::encode(record)?;
        let version = self.version.fetch_add(1, Ordering::SeqCst) + 1;
        self.entries.write().insert(
            key.clone(),
            StoredEntry {
                bytes,
                version,
                metadata,
            },
        );
        Ok(())
    }

    /// Rewrite the last-write timestamp of a stored record
    ///
    /// Test support: backdating a write is how suites age a session lock
    /// past its expiry window. Returns false if the key is absent.
    pub fn set_last_write(&self, key: &DocumentKey, last_write: Timestamp) -> bool {
        let mut entries = self.entries.write();
        match entries.get_mut(key) {
            Some(entry) => {
                entry.metadata.last_write = last_write;
                true
            }
            None => false,
        }
    }
}

impl Backend for MemoryBackend {
    fn transactional_update(
        &self,
        key: &DocumentKey,
        transform: Transform<'_>,
    ) -> Result<UpdateOutcome> {
        let mut logical_attempts = 0usize;

        loop {
            if self.is_closing() {
                debug!(key = %key, "update cancelled by shutdown");
                return Ok(UpdateOutcome::Cancelled);
            }

            // Read phase: snapshot the current entry, then run the transform
            // without holding any lock.
            let (stored, metadata, observed_version) = {
                let entries = self.entries.read();
                match entries.get(key) {
                    Some(entry) => (
                        Some(Self::decode(&entry.bytes)?),
                        entry.metadata.clone(),
                        Some(entry.version),
                    ),
                    None => (None, ReadMetadata::default(), None),
                }
            };

            match transform(stored.as_ref(), &metadata) {
                TransformResult::Fail(err) => return Err(err),
                TransformResult::Retry(reason) => {
                    logical_attempts += 1;
                    if logical_attempts >= self.retry_policy.max_attempts {
                        warn!(
                            key = %key,
                            attempts = logical_attempts,
                            "logical retry budget exhausted"
                        );
                        return Ok(UpdateOutcome::Exhausted(reason));
                    }
                    continue;
                }
                TransformResult::Commit(req) => {
                    let mut entries = self.entries.write();
                    let current_version = entries.get(key).map(|e| e.version);
                    if current_version != observed_version {
                        // Concurrent write since our read: rerun the
                        // transform against the fresher value.
                        debug!(key = %key, "write conflict, re-running transform");
                        continue;
                    }

                    let bytes = Self::encode(&req.record)?;
                    let version = self.version.fetch_add(1, Ordering::SeqCst) + 1;

                    let mut new_metadata = metadata;
                    new_metadata.last_write = Timestamp::now();
                    if let Some(ids) = req.add_owner_ids {
                        for id in ids {
                            if !new_metadata.owner_ids.contains(&id) {
                                new_metadata.owner_ids.push(id);
                            }
                        }
                    }
                    if let Some(extra) = req.attach_metadata {
                        new_metadata.attached.extend(extra);
                    }

                    entries.insert(
                        key.clone(),
                        StoredEntry {
                            bytes,
                            version,
                            metadata: new_metadata.clone(),
                        },
                    );
                    debug!(key = %key, version, "record committed");
                    return Ok(UpdateOutcome::Committed {
                        record: req.record,
                        metadata: new_metadata,
                    });
                }
            }
        }
    }

    fn read_current(&self, key: &DocumentKey) -> Result<Option<(StoredRecord, ReadMetadata)>> {
        let entries = self.entries.read();
        match entries.get(key) {
            Some(entry) => Ok(Some((Self::decode(&entry.bytes)?, entry.metadata.clone()))),
            None => Ok(None),
        }
    }

    fn delete(&self, key: &DocumentKey) -> Result<()> {
        self.entries.write().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{CommitRequest, RetryReason};
    use vellum_core::{JsonValue, LockId};

    fn key(name: &str) -> DocumentKey {
        DocumentKey::new(name).unwrap()
    }

    fn record(coins: i64) -> StoredRecord {
        StoredRecord::new(
            1,
            0,
            Some(LockId::new()),
            JsonValue::from(serde_json::json!({ "coins": coins })),
        )
    }

    #[test]
    fn test_absent_key_presents_default_metadata() {
        let backend = MemoryBackend::new();
        let mut seen = None;
        let mut transform = |stored: Option<&StoredRecord>, meta: &ReadMetadata| {
            seen = Some((stored.cloned(), meta.clone()));
            TransformResult::Commit(CommitRequest::record_only(record(0)))
        };
        backend
            .transactional_update(&key("fresh"), &mut transform)
            .unwrap();
        let (stored, meta) = seen.unwrap();
        assert!(stored.is_none());
        assert_eq!(meta.last_write, Timestamp::EPOCH);
    }

    #[test]
    fn test_commit_roundtrips_record_and_stamps_write_time() {
        let backend = MemoryBackend::new();
        let k = key("player_1");
        let rec = record(42);

        let mut transform =
            |_: Option<&StoredRecord>, _: &ReadMetadata| TransformResult::Commit(CommitRequest::record_only(rec.clone()));
        let outcome = backend.transactional_update(&k, &mut transform).unwrap();

        match outcome {
            UpdateOutcome::Committed { record: committed, metadata } => {
                assert_eq!(committed, rec);
                assert!(metadata.last_write > Timestamp::EPOCH);
            }
            other => panic!("expected commit, got {:?}", other),
        }

        let (read_back, _) = backend.read_current(&k).unwrap().unwrap();
        assert_eq!(read_back, rec);
    }

    #[test]
    fn test_owner_ids_attached_once() {
        let backend = MemoryBackend::new();
        let k = key("owned");

        let mut transform = |_: Option<&StoredRecord>, _: &ReadMetadata| {
            TransformResult::Commit(CommitRequest {
                record: record(0),
                add_owner_ids: Some(vec![7, 7, 9]),
                attach_metadata: None,
            })
        };
        let outcome = backend.transactional_update(&k, &mut transform).unwrap();
        match outcome {
            UpdateOutcome::Committed { metadata, .. } => {
                assert_eq!(metadata.owner_ids, vec![7, 9]);
            }
            other => panic!("expected commit, got {:?}", other),
        }
    }

    #[test]
    fn test_owner_ids_carried_forward_when_none_added() {
        let backend = MemoryBackend::new();
        let k = key("carry");
        let mut create = |_: Option<&StoredRecord>, _: &ReadMetadata| {
            TransformResult::Commit(CommitRequest {
                record: record(0),
                add_owner_ids: Some(vec![11]),
                attach_metadata: None,
            })
        };
        backend.transactional_update(&k, &mut create).unwrap();

        let mut update = |_: Option<&StoredRecord>, _: &ReadMetadata| {
            TransformResult::Commit(CommitRequest::record_only(record(1)))
        };
        let outcome = backend.transactional_update(&k, &mut update).unwrap();
        match outcome {
            UpdateOutcome::Committed { metadata, .. } => assert_eq!(metadata.owner_ids, vec![11]),
            other => panic!("expected commit, got {:?}", other),
        }
    }

    #[test]
    fn test_fail_surfaces_terminally() {
        let backend = MemoryBackend::new();
        let mut transform = |_: Option<&StoredRecord>, _: &ReadMetadata| {
            TransformResult::Fail(VellumError::ValidateFailed { message: None })
        };
        let err = backend
            .transactional_update(&key("bad"), &mut transform)
            .unwrap_err();
        assert!(matches!(err, VellumError::ValidateFailed { .. }));
        assert!(backend.is_empty());
    }

    #[test]
    fn test_retry_exhaustion() {
        let backend = MemoryBackend::new().with_retry_policy(RetryPolicy { max_attempts: 3 });
        let holder = LockId::new();
        let mut calls = 0usize;
        let mut transform = |_: Option<&StoredRecord>, _: &ReadMetadata| {
            calls += 1;
            TransformResult::Retry(RetryReason::SessionLocked { holder })
        };
        let outcome = backend
            .transactional_update(&key("locked"), &mut transform)
            .unwrap();
        assert!(matches!(
            outcome,
            UpdateOutcome::Exhausted(RetryReason::SessionLocked { .. })
        ));
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_write_conflict_reruns_transform_with_fresh_value() {
        let backend = MemoryBackend::new();
        let k = key("contended");
        backend.seed(&k, &record(1), ReadMetadata::default()).unwrap();

        let mut invocations = 0usize;
        let mut seen_coins = Vec::new();
        let mut transform = |stored: Option<&StoredRecord>, _: &ReadMetadata| {
            invocations += 1;
            let coins = stored.unwrap().payload.as_inner()["coins"].as_i64().unwrap();
            seen_coins.push(coins);
            if invocations == 1 {
                // Interleave a foreign write between our read and commit.
                backend.seed(&k, &record(99), ReadMetadata::default()).unwrap();
            }
            TransformResult::Commit(CommitRequest::record_only(record(coins + 1)))
        };

        let outcome = backend.transactional_update(&k, &mut transform).unwrap();
        assert_eq!(invocations, 2);
        assert_eq!(seen_coins, vec![1, 99]);
        match outcome {
            UpdateOutcome::Committed { record: committed, .. } => {
                assert_eq!(committed.payload.as_inner()["coins"], serde_json::json!(100));
            }
            other => panic!("expected commit, got {:?}", other),
        }
    }

    #[test]
    fn test_cancelled_when_shutdown_begun() {
        let signal = ShutdownSignal::new();
        let backend = MemoryBackend::new().with_shutdown_signal(signal.clone());
        signal.begin();

        let mut transform = |_: Option<&StoredRecord>, _: &ReadMetadata| -> TransformResult {
            panic!("transform must not run after shutdown")
        };
        let outcome = backend
            .transactional_update(&key("late"), &mut transform)
            .unwrap();
        assert!(matches!(outcome, UpdateOutcome::Cancelled));
    }

    #[test]
    fn test_delete_then_read_is_none() {
        let backend = MemoryBackend::new();
        let k = key("gone");
        backend.seed(&k, &record(5), ReadMetadata::default()).unwrap();
        assert!(backend.read_current(&k).unwrap().is_some());

        backend.delete(&k).unwrap();
        assert!(backend.read_current(&k).unwrap().is_none());
    }

    #[test]
    fn test_delete_missing_key_is_ok() {
        let backend = MemoryBackend::new();
        assert!(backend.delete(&key("never")).is_ok());
    }

    #[test]
    fn test_set_last_write_backdates() {
        let backend = MemoryBackend::new();
        let k = key("old");
        backend.seed(&k, &record(1), ReadMetadata::default()).unwrap();

        let past = Timestamp::from_secs(1_000);
        assert!(backend.set_last_write(&k, past));
        let (_, meta) = backend.read_current(&k).unwrap().unwrap();
        assert_eq!(meta.last_write, past);

        assert!(!backend.set_last_write(&key("missing"), past));
    }
}
