//! Crawler module for fetching pages and driving a harvest
//!
//! This module contains the networked half of the scraper, including:
//! - HTTP fetching with an explicit retry policy
//! - A bounded worker pool for category jobs
//! - Progress reporting hooks
//! - Overall harvest coordination

mod coordinator;
mod fetcher;
mod pool;
mod progress;
mod retry;

pub use coordinator::Harvester;
pub use fetcher::{build_http_client, Fetcher, Page};
pub use pool::WorkerPool;
pub use progress::{ChannelProgress, LogProgress, NoProgress, ProgressEvent, ProgressReporter};
pub use retry::RetryPolicy;

use crate::config::Config;
use crate::extract::CategoryRecord;
use crate::HarvestError;

/// Runs a complete harvest
///
/// This is the main entry point for scraping with a configuration. It will:
/// 1. Open the on-disk cache under `config.cache.directory`
/// 2. Fetch the sitemap and select the matching category URLs
/// 3. Scrape every category on the worker pool, logging progress
///
/// # Arguments
///
/// * `config` - The harvest configuration
///
/// # Returns
///
/// * `Ok(Vec<CategoryRecord>)` - One record per category, in sitemap order
/// * `Err(HarvestError)` - The harvest failed
pub async fn harvest(config: Config) -> Result<Vec<CategoryRecord>, HarvestError> {
    let harvester = Harvester::with_disk_cache(config)?;
    harvester.run(&LogProgress::new()).await
}
