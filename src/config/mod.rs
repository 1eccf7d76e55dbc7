//! Configuration module for Lesson-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use lesson_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Scraping categories from: {}", config.sitemap_url);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CacheConfig, Config, HttpConfig, RetryConfig, SelectorConfig, WorkerConfig,
};

// Re-export parser and validation functions
pub use parser::{load_config, parse_config};
pub use validation::{compile_category_pattern, validate, MAX_WORKERS};
