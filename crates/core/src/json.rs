//! JSON payload model
//!
//! This module defines the structured value a document carries:
//! - JsonValue: newtype wrapper around serde_json::Value
//! - deep_copy: explicit recursive structural clone with a depth cap
//! - Payload: one-way freezable payload wrapper
//!
//! # Structural Limits
//!
//! Documents are assumed to be tree-shaped. The nesting cap below is the
//! guard against degenerate depth; exceeding it is a configuration error
//! surfaced as `DepthExceeded`, never a stack overflow.

use crate::error::{Result, VellumError};
use serde::{Deserialize, Serialize};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

/// Maximum nesting depth in a document payload (100 levels)
///
/// Prevents stack overflow during recursive operations like deep-copy and
/// structural validation.
pub const MAX_NESTING_DEPTH: usize = 100;

/// JSON value wrapper
///
/// Newtype around serde_json::Value providing:
/// - Direct access to the underlying value via Deref/DerefMut
/// - Easy construction from common types
/// - Structural depth validation
///
/// # Examples
///
/// ```
/// use vellum_core::JsonValue;
///
/// let obj = JsonValue::object();
/// let n = JsonValue::from(42i64);
/// assert!(obj.is_object());
/// assert_eq!(n.as_i64(), Some(42));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct JsonValue(serde_json::Value);

impl JsonValue {
    /// Create a null JSON value
    pub fn null() -> Self {
        JsonValue(serde_json::Value::Null)
    }

    /// Create an empty JSON object
    pub fn object() -> Self {
        JsonValue(serde_json::Value::Object(serde_json::Map::new()))
    }

    /// Create an empty JSON array
    pub fn array() -> Self {
        JsonValue(serde_json::Value::Array(Vec::new()))
    }

    /// Access the underlying serde_json::Value
    pub fn as_inner(&self) -> &serde_json::Value {
        &self.0
    }

    /// Consume the wrapper and return the underlying value
    pub fn into_inner(self) -> serde_json::Value {
        self.0
    }

    /// Compute the nesting depth of this value
    ///
    /// Scalars have depth 1; each container level adds 1. The walk stops
    /// counting past `MAX_NESTING_DEPTH + 1` since anything deeper is
    /// rejected anyway.
    pub fn depth(&self) -> usize {
        fn walk(value: &serde_json::Value, depth: usize) -> usize {
            if depth > MAX_NESTING_DEPTH {
                return depth;
            }
            match value {
                serde_json::Value::Array(items) => items
                    .iter()
                    .map(|v| walk(v, depth + 1))
                    .max()
                    .unwrap_or(depth),
                serde_json::Value::Object(map) => map
                    .values()
                    .map(|v| walk(v, depth + 1))
                    .max()
                    .unwrap_or(depth),
                _ => depth,
            }
        }
        walk(&self.0, 1)
    }

    /// Validate the structural depth of this value
    ///
    /// # Errors
    /// Returns `DepthExceeded` if the value nests deeper than
    /// [`MAX_NESTING_DEPTH`].
    pub fn validate_depth(&self) -> Result<()> {
        let depth = self.depth();
        if depth > MAX_NESTING_DEPTH {
            Err(VellumError::DepthExceeded {
                depth,
                max: MAX_NESTING_DEPTH,
            })
        } else {
            Ok(())
        }
    }
}

impl Deref for JsonValue {
    type Target = serde_json::Value;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for JsonValue {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<I: serde_json::value::Index> std::ops::Index<I> for JsonValue {
    type Output = serde_json::Value;

    fn index(&self, index: I) -> &serde_json::Value {
        &self.0[index]
    }
}

impl<I: serde_json::value::Index> std::ops::IndexMut<I> for JsonValue {
    fn index_mut(&mut self, index: I) -> &mut serde_json::Value {
        &mut self.0[index]
    }
}

impl From<serde_json::Value> for JsonValue {
    fn from(value: serde_json::Value) -> Self {
        JsonValue(value)
    }
}

impl From<JsonValue> for serde_json::Value {
    fn from(value: JsonValue) -> Self {
        value.0
    }
}

impl From<&str> for JsonValue {
    fn from(value: &str) -> Self {
        JsonValue(serde_json::Value::String(value.to_string()))
    }
}

impl From<i64> for JsonValue {
    fn from(value: i64) -> Self {
        JsonValue(serde_json::Value::Number(value.into()))
    }
}

impl From<bool> for JsonValue {
    fn from(value: bool) -> Self {
        JsonValue(serde_json::Value::Bool(value))
    }
}

/// Explicit recursive structural clone of a JSON value
///
/// Walks the closed set of container and scalar kinds, rebuilding each node,
/// and enforces [`MAX_NESTING_DEPTH`] along the way. Used to isolate static
/// default-data templates from the values handed to callers.
///
/// # Errors
/// Returns `DepthExceeded` when the input nests deeper than the cap.
pub fn deep_copy(value: &JsonValue) -> Result<JsonValue> {
    fn clone_node(value: &serde_json::Value, depth: usize) -> Result<serde_json::Value> {
        if depth > MAX_NESTING_DEPTH {
            return Err(VellumError::DepthExceeded {
                depth,
                max: MAX_NESTING_DEPTH,
            });
        }
        Ok(match value {
            serde_json::Value::Null => serde_json::Value::Null,
            serde_json::Value::Bool(b) => serde_json::Value::Bool(*b),
            serde_json::Value::Number(n) => serde_json::Value::Number(n.clone()),
            serde_json::Value::String(s) => serde_json::Value::String(s.clone()),
            serde_json::Value::Array(items) => serde_json::Value::Array(
                items
                    .iter()
                    .map(|v| clone_node(v, depth + 1))
                    .collect::<Result<Vec<_>>>()?,
            ),
            serde_json::Value::Object(map) => {
                let mut out = serde_json::Map::with_capacity(map.len());
                for (k, v) in map {
                    out.insert(k.clone(), clone_node(v, depth + 1)?);
                }
                serde_json::Value::Object(out)
            }
        })
    }
    clone_node(&value.0, 1).map(JsonValue)
}

/// A document payload that can be made immutable exactly once
///
/// Freezing is a one-way transition: a frozen payload is shared behind an
/// `Arc` and exposes no mutable access. Collections configured with
/// `freeze_data` freeze every payload before handing out a document handle.
#[derive(Debug, Clone)]
pub enum Payload {
    /// Caller may mutate the value in place
    Mutable(JsonValue),
    /// Value is immutable and shared
    Frozen(Arc<JsonValue>),
}

impl Payload {
    /// Wrap a value, frozen or not, in one step
    pub fn new(value: JsonValue, freeze: bool) -> Self {
        if freeze {
            Payload::Frozen(Arc::new(value))
        } else {
            Payload::Mutable(value)
        }
    }

    /// Read access to the value
    pub fn value(&self) -> &JsonValue {
        match self {
            Payload::Mutable(v) => v,
            Payload::Frozen(v) => v,
        }
    }

    /// Mutable access to the value; `None` once frozen
    pub fn value_mut(&mut self) -> Option<&mut JsonValue> {
        match self {
            Payload::Mutable(v) => Some(v),
            Payload::Frozen(_) => None,
        }
    }

    /// Whether this payload has been frozen
    pub fn is_frozen(&self) -> bool {
        matches!(self, Payload::Frozen(_))
    }

    /// Freeze this payload in place
    ///
    /// Idempotent; frozen data is never thawed.
    pub fn freeze(&mut self) {
        if let Payload::Mutable(v) = self {
            let value = std::mem::replace(v, JsonValue::null());
            *self = Payload::Frozen(Arc::new(value));
        }
    }
}
