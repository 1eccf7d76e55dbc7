//! Cache store trait and cache keys
//!
//! This module defines the key-value interface the memoizer writes through,
//! and how keys are derived from a function identity and its arguments.

use crate::CacheResult;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;

/// Key of a memoized call
///
/// Hex-encoded SHA-256 over the function identity and the JSON encoding of
/// its arguments. Equal arguments always produce the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derives the key for `function` called with `args`
    pub fn new<A: Serialize + ?Sized>(function: &str, args: &A) -> CacheResult<Self> {
        let encoded_args = serde_json::to_vec(args)?;

        let mut hasher = Sha256::new();
        hasher.update(function.as_bytes());
        hasher.update([0u8]);
        hasher.update(&encoded_args);

        Ok(Self(hex::encode(hasher.finalize())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trait for cache backends
///
/// Implementations must tolerate concurrent calls for distinct keys.
pub trait CacheStore: Send + Sync {
    /// Returns the stored bytes for `key`, if any
    fn get(&self, key: &CacheKey) -> CacheResult<Option<Vec<u8>>>;

    /// Stores `value` under `key`, replacing any previous entry
    fn put(&self, key: &CacheKey, value: &[u8]) -> CacheResult<()>;

    /// Removes one entry, returning whether it existed
    fn remove(&self, key: &CacheKey) -> CacheResult<bool>;

    /// Removes every entry
    fn clear(&self) -> CacheResult<()>;
}
