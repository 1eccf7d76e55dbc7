//! Directory-backed cache store

use crate::cache::traits::{CacheKey, CacheStore};
use crate::CacheResult;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Cache store keeping one JSON file per entry
///
/// Entries live at `<root>/<first two key chars>/<key>.json`. Writes go to a
/// temporary file in the same directory and are renamed into place, so a
/// reader never observes a partially written entry.
#[derive(Debug, Clone)]
pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    /// Opens (creating if needed) a store rooted at `root`
    pub fn open(root: impl Into<PathBuf>) -> CacheResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        tracing::debug!("Opened cache store at {}", root.display());
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        let key = key.as_str();
        let shard = key.get(..2).unwrap_or(key);
        self.root.join(shard).join(format!("{}.json", key))
    }
}

impl CacheStore for DiskStore {
    fn get(&self, key: &CacheKey) -> CacheResult<Option<Vec<u8>>> {
        match fs::read(self.entry_path(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, key: &CacheKey, value: &[u8]) -> CacheResult<()> {
        let path = self.entry_path(key);
        let dir = path.parent().unwrap_or(&self.root);
        fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(value)?;
        tmp.flush()?;
        tmp.persist(&path)?;
        Ok(())
    }

    fn remove(&self, key: &CacheKey) -> CacheResult<bool> {
        match fs::remove_file(self.entry_path(key)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn clear(&self) -> CacheResult<()> {
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.is_dir() {
                fs::remove_dir_all(&path)?;
            } else {
                fs::remove_file(&path)?;
            }
        }
        tracing::info!("Cleared cache store at {}", self.root.display());
        Ok(())
    }
}
