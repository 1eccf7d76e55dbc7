//! In-process cache store

use crate::cache::traits::{CacheKey, CacheStore};
use crate::{CacheError, CacheResult};
use std::collections::HashMap;
use std::sync::Mutex;

/// Cache store backed by a map; nothing survives the process
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheStore for MemoryStore {
    fn get(&self, key: &CacheKey) -> CacheResult<Option<Vec<u8>>> {
        let entries = self.entries.lock().map_err(|_| CacheError::Poisoned)?;
        Ok(entries.get(key.as_str()).cloned())
    }

    fn put(&self, key: &CacheKey, value: &[u8]) -> CacheResult<()> {
        let mut entries = self.entries.lock().map_err(|_| CacheError::Poisoned)?;
        entries.insert(key.as_str().to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &CacheKey) -> CacheResult<bool> {
        let mut entries = self.entries.lock().map_err(|_| CacheError::Poisoned)?;
        Ok(entries.remove(key.as_str()).is_some())
    }

    fn clear(&self) -> CacheResult<()> {
        let mut entries = self.entries.lock().map_err(|_| CacheError::Poisoned)?;
        entries.clear();
        Ok(())
    }
}
