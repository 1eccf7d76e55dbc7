//! Harvest coordinator - main scrape orchestration logic
//!
//! This module ties the pieces of a harvest together:
//! - Fetching (and memoizing) the category sitemap
//! - Expanding category pages into post URLs
//! - Fetching, parsing and memoizing posts
//! - Fanning category jobs out over the worker pool

use crate::cache::{CacheStore, DiskStore, Memoizer};
use crate::config::{compile_category_pattern, validate, Config};
use crate::crawler::fetcher::Fetcher;
use crate::crawler::pool::WorkerPool;
use crate::crawler::progress::ProgressReporter;
use crate::extract::{
    matching_locs, parse_category, parse_post, CategoryPage, CategoryRecord, PageSelectors,
    PostRecord,
};
use crate::HarvestError;
use regex::Regex;
use std::sync::Arc;
use url::Url;

/// Memoization identity of [`Fetcher::fetch_text`]
const FETCH_TEXT: &str = "fetch_text";

/// Memoization identity of post extraction
const EXTRACT_POST: &str = "extract_post";

/// Main harvest coordinator structure
pub struct Harvester {
    config: Config,
    fetcher: Fetcher,
    memo: Memoizer,
    selectors: PageSelectors,
    category_pattern: Regex,
    pool: WorkerPool,
}

impl Harvester {
    /// Creates a harvester that memoizes through `store`
    ///
    /// # Arguments
    ///
    /// * `config` - The harvest configuration (validated here)
    /// * `store` - Cache backend for fetched sitemaps and parsed posts
    ///
    /// # Returns
    ///
    /// * `Ok(Harvester)` - Ready to run
    /// * `Err(HarvestError)` - Invalid configuration or HTTP client failure
    pub fn new(config: Config, store: Arc<dyn CacheStore>) -> Result<Self, HarvestError> {
        validate(&config)?;

        let category_pattern = compile_category_pattern(&config.category_url_pattern)?;
        let selectors = PageSelectors::compile(&config.selectors)?;
        let fetcher = Fetcher::from_config(&config.http, config.retry.policy())?;
        let pool = WorkerPool::new(config.workers.max_workers);

        Ok(Self {
            config,
            fetcher,
            memo: Memoizer::new(store),
            selectors,
            category_pattern,
            pool,
        })
    }

    /// Creates a harvester caching under `config.cache.directory`
    pub fn with_disk_cache(config: Config) -> Result<Self, HarvestError> {
        let store = DiskStore::open(&config.cache.directory)?;
        Self::new(config, Arc::new(store))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn memoizer(&self) -> &Memoizer {
        &self.memo
    }

    /// Memoized [`Fetcher::fetch_text`]
    pub async fn fetch_text_cached(&self, url: &str) -> Result<String, HarvestError> {
        self.memo
            .get_or_compute(FETCH_TEXT, &(url,), || self.fetcher.fetch_text(url))
            .await
    }

    /// Category URLs listed in the sitemap that match the inclusion pattern
    ///
    /// A sitemap that cannot be fetched is logged and yields no URLs.
    pub async fn sitemap_urls(&self) -> Vec<String> {
        let sitemap_url = &self.config.sitemap_url;

        match self.fetch_text_cached(sitemap_url).await {
            Ok(xml) => {
                let urls = matching_locs(&xml, &self.category_pattern);
                tracing::info!(
                    "Found {} matching category URLs in {}",
                    urls.len(),
                    sitemap_url
                );
                urls
            }
            Err(e) => {
                tracing::error!("Failed to fetch sitemap from {}: {}", sitemap_url, e);
                Vec::new()
            }
        }
    }

    /// Fetches a category page and extracts its title and post URLs
    ///
    /// A non-2xx response is logged and yields an empty [`CategoryPage`].
    pub async fn category_page(&self, url: &str) -> Result<CategoryPage, HarvestError> {
        let page = self.fetcher.fetch_page(url).await?;

        if !page.is_success() {
            tracing::warn!(
                "Failed to fetch category page from {} (status {})",
                url,
                page.status
            );
            return Ok(CategoryPage::default());
        }

        let base_url = Url::parse(&page.url)?;
        parse_category(&page.body, &base_url, &self.selectors)
    }

    /// Fetches and parses one post, memoized
    ///
    /// A non-2xx response is logged and yields an empty [`PostRecord`], which
    /// is cached like any other extraction.
    pub async fn post(&self, url: &str) -> Result<PostRecord, HarvestError> {
        self.memo
            .get_or_compute(EXTRACT_POST, &(url, self.selectors.source()), || {
                self.extract_post(url)
            })
            .await
    }

    async fn extract_post(&self, url: &str) -> Result<PostRecord, HarvestError> {
        let page = self.fetcher.fetch_page(url).await?;

        if !page.is_success() {
            tracing::warn!(
                "Failed to fetch post page from {} (status {})",
                url,
                page.status
            );
            return Ok(PostRecord::default());
        }

        parse_post(&page.body, url, &self.selectors)
    }

    /// Scrapes one category: its page, then each of its posts in turn
    pub async fn scrape_category(&self, url: &str) -> Result<CategoryRecord, HarvestError> {
        let page = self.category_page(url).await?;
        tracing::debug!(
            "Category '{}' at {} lists {} posts",
            page.title,
            url,
            page.post_urls.len()
        );

        let mut posts = Vec::with_capacity(page.post_urls.len());
        for post_url in &page.post_urls {
            posts.push(self.post(post_url).await?);
        }

        Ok(CategoryRecord {
            category: page.title,
            posts,
        })
    }

    /// Runs the full harvest
    ///
    /// One job per matching sitemap URL runs on the worker pool. Records come
    /// back in sitemap order. The first hard error aborts the harvest.
    pub async fn run(
        &self,
        progress: &dyn ProgressReporter,
    ) -> Result<Vec<CategoryRecord>, HarvestError> {
        let urls = self.sitemap_urls().await;
        tracing::info!(
            "Scraping {} categories with up to {} workers",
            urls.len(),
            self.pool.workers()
        );

        let records = self
            .pool
            .run(urls, progress, |url: String| async move {
                self.scrape_category(&url).await
            })
            .await?;

        let post_count: usize = records.iter().map(|record| record.posts.len()).sum();
        tracing::info!(
            "Harvested {} posts across {} categories",
            post_count,
            records.len()
        );

        Ok(records)
    }
}

impl std::fmt::Debug for Harvester {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Harvester")
            .field("sitemap_url", &self.config.sitemap_url)
            .field("category_url_pattern", &self.config.category_url_pattern)
            .field("workers", &self.pool.workers())
            .finish_non_exhaustive()
    }
}
