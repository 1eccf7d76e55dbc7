//! Memoization of async computations through a [`CacheStore`]

use crate::cache::traits::{CacheKey, CacheStore};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;

/// Envelope written for every cached value
#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry<T> {
    function: String,
    stored_at: DateTime<Utc>,
    value: T,
}

/// Returns previously computed results for repeated calls
///
/// The store is injected, so callers choose between a [`DiskStore`] that
/// survives restarts and a [`MemoryStore`] for tests.
///
/// Cache failures never fail the computation: unreadable or undecodable
/// entries are treated as misses, and failed writes are logged.
///
/// [`DiskStore`]: crate::cache::DiskStore
/// [`MemoryStore`]: crate::cache::MemoryStore
#[derive(Clone)]
pub struct Memoizer {
    store: Arc<dyn CacheStore>,
}

impl Memoizer {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    /// Returns the cached result of `function(args)` or computes and stores it
    ///
    /// Only `Ok` results are stored; an error is returned to the caller and
    /// the next call computes again.
    pub async fn get_or_compute<A, T, E, F, Fut>(
        &self,
        function: &str,
        args: &A,
        compute: F,
    ) -> Result<T, E>
    where
        A: Serialize + ?Sized,
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let key = match CacheKey::new(function, args) {
            Ok(key) => Some(key),
            Err(e) => {
                tracing::warn!("Cannot derive cache key for {}: {}", function, e);
                None
            }
        };

        if let Some(key) = &key {
            if let Some(value) = self.lookup(function, key) {
                return Ok(value);
            }
        }

        let value = compute().await?;

        if let Some(key) = &key {
            self.save(function, key, &value);
        }

        Ok(value)
    }

    /// Drops every memoized result
    pub fn clear(&self) -> crate::CacheResult<()> {
        self.store.clear()
    }

    fn lookup<T: DeserializeOwned>(&self, function: &str, key: &CacheKey) -> Option<T> {
        let bytes = match self.store.get(key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                tracing::trace!("Cache miss for {} ({})", function, key);
                return None;
            }
            Err(e) => {
                tracing::warn!("Cache read failed for {} ({}): {}", function, key, e);
                return None;
            }
        };

        match serde_json::from_slice::<StoredEntry<T>>(&bytes) {
            Ok(entry) => {
                tracing::trace!(
                    "Cache hit for {} ({}), stored at {}",
                    function,
                    key,
                    entry.stored_at
                );
                Some(entry.value)
            }
            Err(e) => {
                tracing::warn!("Discarding undecodable cache entry {} for {}: {}", key, function, e);
                None
            }
        }
    }

    fn save<T: Serialize>(&self, function: &str, key: &CacheKey, value: &T) {
        let entry = StoredEntry {
            function: function.to_string(),
            stored_at: Utc::now(),
            value,
        };

        let result = serde_json::to_vec(&entry)
            .map_err(crate::CacheError::from)
            .and_then(|bytes| self.store.put(key, &bytes));

        if let Err(e) = result {
            tracing::warn!("Cache write failed for {} ({}): {}", function, key, e);
        }
    }
}

impl std::fmt::Debug for Memoizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memoizer").finish_non_exhaustive()
    }
}
