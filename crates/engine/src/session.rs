//! Session lock arbitration
//!
//! Decides, from the previously stored lock identifier and the backend's
//! last-write timestamp, whether a document is currently owned by another
//! process and whether that ownership has expired.

use std::time::Duration;
use vellum_core::{LockId, StoredRecord, Timestamp};

/// How long a session lock survives backend inactivity (30 minutes)
///
/// A record whose last write is older than this is stale and eligible for
/// takeover. This is a data-driven business rule, not a scheduling timeout.
pub const LOCK_EXPIRE: Duration = Duration::from_secs(30 * 60);

/// Whether a document may be taken by this process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// No live owner; the document may be acquired
    Available,
    /// Another session holds a live lock
    OwnedByOther(LockId),
}

/// Arbitrate ownership of a stored record
///
/// Available when the record is absent, no lock owner is recorded, or the
/// last write is at least [`LOCK_EXPIRE`] in the past. A last-write time in
/// the future (clock skew) counts as live ownership; the window simply has
/// not elapsed.
pub fn evaluate(record: Option<&StoredRecord>, last_write: Timestamp, now: Timestamp) -> Ownership {
    let Some(holder) = record.and_then(|r| r.lock_owner) else {
        return Ownership::Available;
    };
    match now.duration_since(last_write) {
        Some(elapsed) if elapsed >= LOCK_EXPIRE => Ownership::Available,
        _ => Ownership::OwnedByOther(holder),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vellum_core::JsonValue;

    fn locked_record() -> (StoredRecord, LockId) {
        let holder = LockId::new();
        (
            StoredRecord::new(0, 0, Some(holder), JsonValue::object()),
            holder,
        )
    }

    #[test]
    fn test_absent_record_is_available() {
        let now = Timestamp::from_secs(1_000);
        assert_eq!(evaluate(None, Timestamp::EPOCH, now), Ownership::Available);
    }

    #[test]
    fn test_unlocked_record_is_available() {
        let record = StoredRecord::new(0, 0, None, JsonValue::object());
        let now = Timestamp::from_secs(1_000);
        assert_eq!(
            evaluate(Some(&record), Timestamp::from_secs(999), now),
            Ownership::Available
        );
    }

    #[test]
    fn test_fresh_lock_is_owned() {
        let (record, holder) = locked_record();
        let last_write = Timestamp::from_secs(10_000);
        let now = last_write.saturating_add(Duration::from_secs(60));
        assert_eq!(
            evaluate(Some(&record), last_write, now),
            Ownership::OwnedByOther(holder)
        );
    }

    #[test]
    fn test_lock_just_inside_window_is_owned() {
        let (record, holder) = locked_record();
        let last_write = Timestamp::from_secs(10_000);
        let now = last_write
            .saturating_add(LOCK_EXPIRE)
            .saturating_sub(Duration::from_micros(1));
        assert_eq!(
            evaluate(Some(&record), last_write, now),
            Ownership::OwnedByOther(holder)
        );
    }

    #[test]
    fn test_lock_at_exact_expiry_is_available() {
        let (record, _) = locked_record();
        let last_write = Timestamp::from_secs(10_000);
        let now = last_write.saturating_add(LOCK_EXPIRE);
        assert_eq!(evaluate(Some(&record), last_write, now), Ownership::Available);
    }

    #[test]
    fn test_future_last_write_counts_as_owned() {
        let (record, holder) = locked_record();
        let now = Timestamp::from_secs(10_000);
        let last_write = now.saturating_add(Duration::from_secs(5));
        assert_eq!(
            evaluate(Some(&record), last_write, now),
            Ownership::OwnedByOther(holder)
        );
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// The expiry window alone decides ownership of a locked record.
            #[test]
            fn window_boundary_decides_ownership(elapsed_secs in 0u64..7_200) {
                let (record, holder) = locked_record();
                let last_write = Timestamp::from_secs(100_000);
                let now = last_write.saturating_add(Duration::from_secs(elapsed_secs));

                let expected = if Duration::from_secs(elapsed_secs) >= LOCK_EXPIRE {
                    Ownership::Available
                } else {
                    Ownership::OwnedByOther(holder)
                };
                prop_assert_eq!(evaluate(Some(&record), last_write, now), expected);
            }
        }
    }
}
