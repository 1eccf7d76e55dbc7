//! Lesson-Harvest: a lesson corpus scraper
//!
//! This crate walks a language-learning site's category sitemap, expands each
//! category page into its posts and extracts every post's title, prose and
//! tables into a corpus of [`CategoryRecord`]s.

pub mod cache;
pub mod config;
pub mod crawler;
pub mod extract;

use thiserror::Error;

/// Main error type for Lesson-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Unexpected status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Element '{selector}' not found on {url}")]
    MissingElement { url: String, selector: String },

    #[error("Invalid CSS selector: {0}")]
    InvalidSelector(String),

    #[error("Markdown conversion failed for {url}: {message}")]
    Markdown { url: String, message: String },

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

impl HarvestError {
    /// Whether a retry policy may try the failed operation again
    ///
    /// Transport failures and HTTP-level status errors are retryable;
    /// parse failures and missing elements mean the page itself is wrong.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Http { .. } | Self::Status { .. } | Self::Reqwest(_)
        )
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid URL pattern: {0}")]
    InvalidPattern(String),
}

/// Cache-store errors
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to persist cache entry: {0}")]
    Persist(#[from] tempfile::PersistError),

    #[error("Cache lock poisoned")]
    Poisoned,
}

/// Result type alias for Lesson-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for cache operations
pub type CacheResult<T> = std::result::Result<T, CacheError>;

// Re-export commonly used types
pub use cache::{CacheStore, DiskStore, MemoryStore, Memoizer};
pub use config::Config;
pub use crawler::{Harvester, RetryPolicy};
pub use extract::{CategoryPage, CategoryRecord, PostRecord, Table};
