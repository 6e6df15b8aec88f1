//! Document loader
//!
//! Drives one transactional attempt end-to-end, combining the default data
//! factory, the session lock arbiter, the migration engine, and the
//! validation gate into a single transform answer.
//!
//! The backend may invoke the transform repeatedly for the same logical
//! attempt (its own optimistic retry on write conflicts), so the attempt is
//! a pure function of its inputs: no external mutation, no state carried
//! between invocations. The only non-determinism is the fresh lock
//! identifier minted per attempt, which is what makes a takeover after
//! expiry indistinguishable from a fresh acquisition.

use tracing::debug;
use vellum_backend::{CommitRequest, ReadMetadata, RetryReason, TransformResult};
use vellum_core::{CollectionOptions, DocumentKey, LockId, StoredRecord, Timestamp};

use crate::defaults;
use crate::migration;
use crate::session::{self, Ownership};
use crate::validate;

/// Inputs shared by every attempt of one `load` call
pub(crate) struct AttemptContext<'a> {
    /// Validated collection configuration
    pub options: &'a CollectionOptions,
    /// Key being loaded
    pub key: &'a DocumentKey,
    /// Owner ids to associate on first-time creation
    pub owner_ids: Option<&'a [u64]>,
}

/// Decide the outcome of one transactional attempt
///
/// Transition logic, given the stored record (or absence) and read-side
/// metadata:
/// - absent record: synthesize default data and commit a fresh record at
///   the full chain version with a new lock id
/// - present record: arbitrate the session lock, then migrate, then
///   validate, then commit the upgraded record under a new lock id
pub(crate) fn attempt(
    ctx: &AttemptContext<'_>,
    stored: Option<&StoredRecord>,
    metadata: &ReadMetadata,
    now: Timestamp,
) -> TransformResult {
    let chain = &ctx.options.migrations;

    let Some(record) = stored else {
        let payload = match defaults::make_default(ctx.options, ctx.key) {
            Ok(payload) => payload,
            Err(err) => return TransformResult::Fail(err),
        };
        let fresh = StoredRecord::new(
            chain.current_version(),
            migration::full_chain_compatibility(chain),
            Some(LockId::new()),
            payload,
        );
        debug!(key = %ctx.key, "creating first-time record");
        return TransformResult::Commit(CommitRequest {
            record: fresh,
            add_owner_ids: ctx.owner_ids.map(<[u64]>::to_vec),
            attach_metadata: None,
        });
    };

    match session::evaluate(stored, metadata.last_write, now) {
        Ownership::OwnedByOther(holder) => {
            debug!(key = %ctx.key, holder = %holder, "session locked, asking backend to retry");
            TransformResult::Retry(RetryReason::SessionLocked { holder })
        }
        Ownership::Available => {
            let outcome = match migration::run_chain(chain, record, ctx.key) {
                Ok(outcome) => outcome,
                Err(err) => return TransformResult::Fail(err),
            };
            if let Err(err) = validate::check(ctx.options.validate.as_ref(), &outcome.payload) {
                return TransformResult::Fail(err);
            }
            let updated = StoredRecord::new(
                record.schema_version.max(chain.current_version()),
                outcome.last_compatible_version,
                Some(LockId::new()),
                outcome.payload,
            );
            // Existing owner ids and attached metadata carry forward
            // untouched when nothing is added.
            TransformResult::Commit(CommitRequest::record_only(updated))
        }
    }
}
