//! Foundational identifier types
//!
//! This module defines:
//! - DocumentKey: the caller-chosen name of a document within a collection
//! - LockId: unique identifier for a session-lock claim

use crate::error::{Result, VellumError};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Maximum document key length in bytes
///
/// Keys longer than this are rejected at construction. The limit bounds
/// backend key sizes and keeps log lines readable.
pub const MAX_KEY_LENGTH: usize = 256;

/// The caller-chosen name of a document within a collection
///
/// Keys are non-empty UTF-8 strings of at most [`MAX_KEY_LENGTH`] bytes.
/// They are validated once at construction; everything downstream can
/// assume a well-formed key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentKey(String);

impl DocumentKey {
    /// Create a validated document key
    ///
    /// # Errors
    /// Returns `InvalidKey` if the key is empty or exceeds [`MAX_KEY_LENGTH`].
    pub fn new(key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        if key.is_empty() {
            return Err(VellumError::InvalidKey {
                message: "key must not be empty".to_string(),
            });
        }
        if key.len() > MAX_KEY_LENGTH {
            return Err(VellumError::InvalidKey {
                message: format!("key length {} exceeds maximum of {}", key.len(), MAX_KEY_LENGTH),
            });
        }
        Ok(Self(key))
    }

    /// View the key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a session-lock claim
///
/// A LockId is a wrapper around a UUID v4. A fresh LockId is minted for
/// every load attempt, so a takeover after lock expiry is indistinguishable
/// from a fresh acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LockId(Uuid);

impl LockId {
    /// Create a new random LockId using UUID v4
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a LockId from raw bytes
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// Parse a LockId from a string representation
    ///
    /// Accepts standard UUID format. Returns None if the string is not a
    /// valid UUID.
    pub fn from_string(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }

    /// Get the raw bytes of this LockId
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl Default for LockId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
