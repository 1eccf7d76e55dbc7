//! Extraction of links and lesson content from fetched documents
//!
//! This module contains the pure parsing half of the scraper:
//! - `<loc>` entries of the category sitemap
//! - Category titles and post links
//! - Post titles, paragraphs and tables
//!
//! Nothing here performs I/O; see [`crate::crawler`] for fetching.

mod category;
mod post;
mod sitemap;
mod table;

pub use category::parse_category;
pub use post::parse_post;
pub use sitemap::matching_locs;
pub use table::{parse_table, Table};

use crate::config::SelectorConfig;
use crate::HarvestError;
use scraper::Selector;
use serde::{Deserialize, Serialize};

/// Content extracted from one post page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    pub title: String,

    /// Title heading followed by the paragraphs, as markdown
    pub text: String,

    /// Title heading, paragraphs and tables in document order, as markdown
    pub content: String,

    /// Every table of the post, parsed
    pub tables: Vec<Table>,
}

impl PostRecord {
    /// True for the placeholder substituted when a post could not be fetched
    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.content.is_empty() && self.tables.is_empty()
    }
}

/// Category title together with every post of that category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub category: String,
    pub posts: Vec<PostRecord>,
}

/// Links found on a category page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPage {
    pub title: String,
    pub post_urls: Vec<String>,
}

/// Compiled CSS selectors for category and post pages
#[derive(Debug, Clone)]
pub struct PageSelectors {
    pub(crate) category_title: Selector,
    pub(crate) post_link: Selector,
    pub(crate) post_title: Selector,
    pub(crate) post_body: Selector,
    source: SelectorConfig,
}

impl PageSelectors {
    /// Compiles every selector of `config`
    pub fn compile(config: &SelectorConfig) -> Result<Self, HarvestError> {
        Ok(Self {
            category_title: compile_selector(&config.category_title)?,
            post_link: compile_selector(&config.post_link)?,
            post_title: compile_selector(&config.post_title)?,
            post_body: compile_selector(&config.post_body)?,
            source: config.clone(),
        })
    }

    /// The selector strings these were compiled from
    pub fn source(&self) -> &SelectorConfig {
        &self.source
    }
}

fn compile_selector(selector: &str) -> Result<Selector, HarvestError> {
    Selector::parse(selector)
        .map_err(|e| HarvestError::InvalidSelector(format!("'{}': {:?}", selector, e)))
}

/// Collapses runs of whitespace into single spaces and trims the ends
pub(crate) fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
