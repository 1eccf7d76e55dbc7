//! Cache module for memoizing fetches and parsed posts
//!
//! This module provides:
//! - The [`CacheStore`] key-value interface and [`CacheKey`] derivation
//! - A directory-backed store that survives process restarts
//! - An in-memory store for tests
//! - The [`Memoizer`] that wraps async computations

mod disk;
mod memoize;
mod memory;
mod traits;

pub use disk::DiskStore;
pub use memoize::Memoizer;
pub use memory::MemoryStore;
pub use traits::{CacheKey, CacheStore};
