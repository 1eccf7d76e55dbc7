//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the scraper, including:
//! - Building the HTTP client from configuration
//! - Single GET attempts that report status and body
//! - Retrying fetches under a [`RetryPolicy`]

use crate::config::HttpConfig;
use crate::crawler::retry::RetryPolicy;
use crate::HarvestError;
use reqwest::Client;
use std::time::Duration;

/// A fetched document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Final URL after redirects
    pub url: String,

    /// HTTP status code
    pub status: u16,

    /// Response body
    pub body: String,
}

impl Page {
    /// True for 2xx responses
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The HTTP configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use lesson_harvest::config::HttpConfig;
/// use lesson_harvest::crawler::build_http_client;
///
/// let client = build_http_client(&HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// GET requests with retries
///
/// # Retry Logic
///
/// | Condition | [`fetch_text`](Fetcher::fetch_text) | [`fetch_page`](Fetcher::fetch_page) |
/// |-----------|------------|------------|
/// | Transport failure (connect, timeout, body read) | retried | retried |
/// | Non-2xx status | retried | returned to the caller |
/// | 2xx status | body returned | page returned |
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    retry: RetryPolicy,
}

impl Fetcher {
    pub fn new(client: Client, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    /// Builds a fetcher from the HTTP configuration and a retry policy
    pub fn from_config(config: &HttpConfig, retry: RetryPolicy) -> Result<Self, HarvestError> {
        Ok(Self::new(build_http_client(config)?, retry))
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Makes a single GET request without judging the status code
    pub async fn get(&self, url: &str) -> Result<Page, HarvestError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| HarvestError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        tracing::debug!("GET {} -> {}", url, status);

        let body = response.text().await.map_err(|source| HarvestError::Http {
            url: url.to_string(),
            source,
        })?;

        Ok(Page {
            url: final_url,
            status,
            body,
        })
    }

    /// Fetches the body of `url`, treating any non-2xx status as a failure
    ///
    /// Transport failures and error statuses are retried; once the policy
    /// gives up the last error is returned.
    pub async fn fetch_text(&self, url: &str) -> Result<String, HarvestError> {
        self.retry
            .run(url, || async move {
                let page = self.get(url).await?;
                if !page.is_success() {
                    return Err(HarvestError::Status {
                        url: url.to_string(),
                        status: page.status,
                    });
                }
                Ok(page.body)
            })
            .await
    }

    /// Fetches `url`, retrying transport failures only
    ///
    /// The returned page may carry any status; callers decide how to treat it.
    pub async fn fetch_page(&self, url: &str) -> Result<Page, HarvestError> {
        self.retry.run(url, || self.get(url)).await
    }
}
