//! Category page parsing

use crate::extract::{CategoryPage, PageSelectors};
use crate::HarvestError;
use scraper::Html;
use url::Url;

/// Extracts the category title and the post links of a category page
///
/// Post links keep their order on the page. Relative links are resolved
/// against `page_url`; anchors without a usable `href` are skipped.
///
/// # Errors
///
/// [`HarvestError::MissingElement`] if the page has no category title, which
/// means the site layout no longer matches the selectors.
pub fn parse_category(
    html: &str,
    page_url: &Url,
    selectors: &PageSelectors,
) -> Result<CategoryPage, HarvestError> {
    let document = Html::parse_document(html);

    let title = document
        .select(&selectors.category_title)
        .next()
        .map(|heading| heading.text().collect::<String>().trim().to_string())
        .ok_or_else(|| HarvestError::MissingElement {
            url: page_url.to_string(),
            selector: selectors.source().category_title.clone(),
        })?;

    let post_urls = document
        .select(&selectors.post_link)
        .filter_map(|link| link.value().attr("href"))
        .filter_map(|href| resolve_link(href, page_url))
        .collect();

    Ok(CategoryPage { title, post_urls })
}

/// Resolves a link href to an absolute http(s) URL
///
/// Returns None for empty hrefs, fragment-only links, non-HTTP schemes and
/// anything that does not parse.
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    match absolute_url.scheme() {
        "http" | "https" => Some(absolute_url.to_string()),
        _ => None,
    }
}
