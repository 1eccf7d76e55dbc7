use crate::config::types::{
    CacheConfig, Config, HttpConfig, RetryConfig, SelectorConfig, WorkerConfig,
};
use crate::ConfigError;
use regex::Regex;
use scraper::Selector;
use url::Url;

/// Upper bound for the worker pool size
pub const MAX_WORKERS: usize = 256;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_sitemap_url(&config.sitemap_url)?;
    compile_category_pattern(&config.category_url_pattern)?;
    validate_http_config(&config.http)?;
    validate_retry_config(&config.retry)?;
    validate_cache_config(&config.cache)?;
    validate_worker_config(&config.workers)?;
    validate_selectors(&config.selectors)?;
    Ok(())
}

/// Compiles the category inclusion pattern
///
/// The pattern is anchored at the start of the URL, so `https://site/category/`
/// does not match `https://mirror/?u=https://site/category/`.
pub fn compile_category_pattern(pattern: &str) -> Result<Regex, ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "category_url_pattern cannot be empty".to_string(),
        ));
    }

    Regex::new(&format!("^(?:{})", pattern))
        .map_err(|e| ConfigError::InvalidPattern(format!("'{}': {}", pattern, e)))
}

fn validate_sitemap_url(sitemap_url: &str) -> Result<(), ConfigError> {
    let url = Url::parse(sitemap_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid sitemap_url '{}': {}", sitemap_url, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "sitemap_url '{}' must use http or https",
            sitemap_url
        )));
    }

    Ok(())
}

fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.connect_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "connect_timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if !config.multiplier.is_finite() || config.multiplier < 1.0 {
        return Err(ConfigError::Validation(format!(
            "multiplier must be >= 1.0, got {}",
            config.multiplier
        )));
    }

    if let Some(max_interval) = config.max_interval_ms {
        if max_interval < config.initial_interval_ms {
            return Err(ConfigError::Validation(format!(
                "max_interval_ms ({}) must be >= initial_interval_ms ({})",
                max_interval, config.initial_interval_ms
            )));
        }
    }

    if config.max_attempts == Some(0) {
        return Err(ConfigError::Validation(
            "max_attempts must be >= 1 when set".to_string(),
        ));
    }

    Ok(())
}

fn validate_cache_config(config: &CacheConfig) -> Result<(), ConfigError> {
    if config.directory.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "cache directory cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_worker_config(config: &WorkerConfig) -> Result<(), ConfigError> {
    if config.max_workers < 1 || config.max_workers > MAX_WORKERS {
        return Err(ConfigError::Validation(format!(
            "max_workers must be between 1 and {}, got {}",
            MAX_WORKERS, config.max_workers
        )));
    }
    Ok(())
}

fn validate_selectors(config: &SelectorConfig) -> Result<(), ConfigError> {
    for (name, selector) in [
        ("category_title", &config.category_title),
        ("post_link", &config.post_link),
        ("post_title", &config.post_title),
        ("post_body", &config.post_body),
    ] {
        Selector::parse(selector).map_err(|e| {
            ConfigError::Validation(format!("Invalid {} selector '{}': {:?}", name, selector, e))
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_pattern_is_anchored() {
        let regex = compile_category_pattern("https://example.com/category/finnish-.*").unwrap();

        assert!(regex.is_match("https://example.com/category/finnish-verbs/"));
        assert!(!regex.is_match("https://example.com/category/swedish/"));
        assert!(!regex.is_match("https://mirror.net/?u=https://example.com/category/finnish-x"));
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(matches!(
            compile_category_pattern("https://example.com/(unclosed"),
            Err(ConfigError::InvalidPattern(_))
        ));
        assert!(compile_category_pattern("").is_err());
    }

    #[test]
    fn test_validate_sitemap_url() {
        assert!(validate_sitemap_url("https://example.com/sitemap.xml").is_ok());
        assert!(validate_sitemap_url("http://127.0.0.1:8080/sitemap.xml").is_ok());

        assert!(validate_sitemap_url("not a url").is_err());
        assert!(validate_sitemap_url("ftp://example.com/sitemap.xml").is_err());
    }

    #[test]
    fn test_validate_workers() {
        assert!(validate_worker_config(&WorkerConfig { max_workers: 1 }).is_ok());
        assert!(validate_worker_config(&WorkerConfig { max_workers: 64 }).is_ok());

        assert!(validate_worker_config(&WorkerConfig { max_workers: 0 }).is_err());
        assert!(validate_worker_config(&WorkerConfig { max_workers: 1000 }).is_err());
    }

    #[test]
    fn test_validate_retry() {
        let mut retry = RetryConfig::default();
        assert!(validate_retry_config(&retry).is_ok());

        retry.multiplier = 0.5;
        assert!(validate_retry_config(&retry).is_err());

        retry.multiplier = 2.0;
        retry.max_interval_ms = Some(10);
        assert!(validate_retry_config(&retry).is_err());

        retry.max_interval_ms = None;
        retry.max_attempts = Some(0);
        assert!(validate_retry_config(&retry).is_err());
    }

    #[test]
    fn test_validate_selectors() {
        let mut selectors = SelectorConfig::default();
        assert!(validate_selectors(&selectors).is_ok());

        selectors.post_body = "article[".to_string();
        assert!(validate_selectors(&selectors).is_err());
    }
}
