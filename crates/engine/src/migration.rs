//! Migration engine
//!
//! Applies an ordered chain of schema transforms to a stored record,
//! producing the current payload plus version metadata. Records at or above
//! the chain length pass through unchanged: forward compatibility is
//! assumed, not rejected.

use tracing::debug;
use vellum_core::{DocumentKey, JsonValue, MigrationChain, Result, StoredRecord, VellumError};

/// Result of running the chain over one stored record
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationOutcome {
    /// The payload after all applicable steps
    pub payload: JsonValue,
    /// New last-compatible version: the stored value, raised to the highest
    /// marker declared in the applied range. Never decreases.
    pub last_compatible_version: u32,
}

/// Apply the chain entries `[record.schema_version, chain.len())` in order
///
/// Each entry receives the payload produced by the previous one (or the
/// stored payload for the first). Any step error aborts the whole sequence;
/// nothing partial is persisted.
///
/// # Errors
///
/// Returns `Migration` carrying the failing step index and its message.
pub fn run_chain(
    chain: &MigrationChain,
    record: &StoredRecord,
    key: &DocumentKey,
) -> Result<MigrationOutcome> {
    let current = chain.current_version();
    if record.schema_version >= current {
        // Already current, or newer than this process knows.
        return Ok(MigrationOutcome {
            payload: record.payload.clone(),
            last_compatible_version: record.last_compatible_version,
        });
    }

    let start = record.schema_version as usize;
    let mut payload = record.payload.clone();
    let mut applied_marker = 0u32;

    for (offset, step) in chain.slice(start, current as usize).iter().enumerate() {
        let index = (start + offset) as u32;
        payload = step.apply(payload).map_err(|message| VellumError::Migration {
            step: index,
            message,
        })?;
        if let Some(marker) = step.compatible_version() {
            applied_marker = applied_marker.max(marker);
        }
    }

    debug!(
        key = %key,
        from = record.schema_version,
        to = current,
        "migration chain applied"
    );

    Ok(MigrationOutcome {
        payload,
        last_compatible_version: record.last_compatible_version.max(applied_marker),
    })
}

/// Highest compatibility marker declared over the *full* chain (0 if none)
///
/// Used only for newly created default-data records, where there is no
/// prior stored value to compare against.
pub fn full_chain_compatibility(chain: &MigrationChain) -> u32 {
    chain
        .iter()
        .filter_map(|m| m.compatible_version())
        .max()
        .unwrap_or(0)
}
