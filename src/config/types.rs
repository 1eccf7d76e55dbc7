use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::crawler::RetryPolicy;

/// Main configuration structure for Lesson-Harvest
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Sitemap listing the category pages
    #[serde(default = "default_sitemap_url")]
    pub sitemap_url: String,

    /// Regex a sitemap `<loc>` must match (from its start) to be scraped
    #[serde(default = "default_category_url_pattern")]
    pub category_url_pattern: String,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub workers: WorkerConfig,

    #[serde(default)]
    pub selectors: SelectorConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sitemap_url: default_sitemap_url(),
            category_url_pattern: default_category_url_pattern(),
            http: HttpConfig::default(),
            retry: RetryConfig::default(),
            cache: CacheConfig::default(),
            workers: WorkerConfig::default(),
            selectors: SelectorConfig::default(),
        }
    }
}

impl Config {
    /// Default configuration pointed at another sitemap and pattern
    pub fn new(sitemap_url: impl Into<String>, category_url_pattern: impl Into<String>) -> Self {
        Self {
            sitemap_url: sitemap_url.into(),
            category_url_pattern: category_url_pattern.into(),
            ..Self::default()
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct HttpConfig {
    pub user_agent: String,

    /// Whole-request timeout (seconds)
    pub timeout_secs: u64,

    pub connect_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("lesson-harvest/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

/// Exponential backoff settings for fetches
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct RetryConfig {
    /// Delay before the first retry (milliseconds)
    pub initial_interval_ms: u64,

    /// Growth factor between consecutive delays
    pub multiplier: f64,

    /// Upper bound for a single delay (milliseconds)
    pub max_interval_ms: Option<u64>,

    /// Total wall-clock budget across all attempts (seconds)
    pub max_elapsed_secs: u64,

    /// Optional cap on the number of attempts
    pub max_attempts: Option<u32>,

    /// Randomise each delay between zero and its nominal value
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_interval_ms: 1000,
            multiplier: 2.0,
            max_interval_ms: None,
            max_elapsed_secs: 60,
            max_attempts: None,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Builds the retry policy described by this configuration
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            initial_interval: Duration::from_millis(self.initial_interval_ms),
            multiplier: self.multiplier,
            max_interval: self.max_interval_ms.map(Duration::from_millis),
            max_elapsed: Duration::from_secs(self.max_elapsed_secs),
            max_attempts: self.max_attempts,
            jitter: self.jitter,
        }
    }
}

/// On-disk memoization settings
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CacheConfig {
    /// Directory holding cached fetches and parsed posts
    pub directory: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(".harvest_cache"),
        }
    }
}

/// Fan-out settings
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct WorkerConfig {
    /// Number of category jobs processed concurrently
    pub max_workers: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self { max_workers: 64 }
    }
}

/// CSS selectors describing the site's page structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SelectorConfig {
    /// Heading holding a category page's title
    pub category_title: String,

    /// Links from a category page to its posts
    pub post_link: String,

    /// Heading holding a post's title
    pub post_title: String,

    /// Container whose children make up a post's body
    pub post_body: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            category_title: "h1.archive_title".to_string(),
            post_link: "a.entry_title".to_string(),
            post_title: "h1.post_title".to_string(),
            post_body: "article#post_body".to_string(),
        }
    }
}

fn default_sitemap_url() -> String {
    "https://uusikielemme.fi/category-sitemap.xml".to_string()
}

fn default_category_url_pattern() -> String {
    "https://uusikielemme.fi/category/finnish-.*".to_string()
}
