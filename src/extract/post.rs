//! Post page parsing

use crate::extract::table::parse_table;
use crate::extract::{PageSelectors, PostRecord};
use crate::HarvestError;
use scraper::{ElementRef, Html};

/// Extracts title, prose and tables from a post page
///
/// The direct children of the post body are visited in document order:
///
/// | Element | Handling |
/// |---------|----------|
/// | `<p>` | markdown added to `content` and `text` |
/// | `<table>` | markdown added to `content`, parsed table added to `tables` |
/// | `<ul>`, `<div>` | skipped |
/// | anything else | skipped |
///
/// Lists and `<div>` blocks never reach the corpus, whatever they contain.
/// Empty paragraphs are dropped.
///
/// # Errors
///
/// [`HarvestError::MissingElement`] when the title or body container is
/// absent, and [`HarvestError::Markdown`] if a paragraph cannot be converted.
pub fn parse_post(
    html: &str,
    page_url: &str,
    selectors: &PageSelectors,
) -> Result<PostRecord, HarvestError> {
    let document = Html::parse_document(html);

    let title = document
        .select(&selectors.post_title)
        .next()
        .map(|heading| heading.text().collect::<String>().trim().to_string())
        .ok_or_else(|| missing(page_url, &selectors.source().post_title))?;

    let body = document
        .select(&selectors.post_body)
        .next()
        .ok_or_else(|| missing(page_url, &selectors.source().post_body))?;

    let heading = format!("# {}", title);
    let mut content_blocks = vec![heading.clone()];
    let mut text_blocks = vec![heading];
    let mut tables = Vec::new();

    for child in body.children().filter_map(ElementRef::wrap) {
        match child.value().name() {
            "p" => {
                let markdown = paragraph_markdown(child, page_url)?;
                if !markdown.is_empty() {
                    content_blocks.push(markdown.clone());
                    text_blocks.push(markdown);
                }
            }
            "table" => {
                let (table, markdown) = parse_table(child);
                if !markdown.is_empty() {
                    content_blocks.push(markdown);
                }
                tables.push(table);
            }
            "ul" | "div" => {
                tracing::trace!("Skipping <{}> block in {}", child.value().name(), page_url);
            }
            other => {
                tracing::trace!("Ignoring <{}> element in {}", other, page_url);
            }
        }
    }

    tracing::debug!(
        "Parsed post '{}' from {}: {} blocks, {} tables",
        title,
        page_url,
        content_blocks.len() - 1,
        tables.len()
    );

    Ok(PostRecord {
        title,
        text: text_blocks.join("\n\n"),
        content: content_blocks.join("\n\n"),
        tables,
    })
}

fn paragraph_markdown(paragraph: ElementRef<'_>, page_url: &str) -> Result<String, HarvestError> {
    htmd::convert(&paragraph.html())
        .map(|markdown| markdown.trim().to_string())
        .map_err(|e| HarvestError::Markdown {
            url: page_url.to_string(),
            message: e.to_string(),
        })
}

fn missing(page_url: &str, selector: &str) -> HarvestError {
    HarvestError::MissingElement {
        url: page_url.to_string(),
        selector: selector.to_string(),
    }
}
