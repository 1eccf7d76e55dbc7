//! Sitemap `<loc>` extraction

use regex::{Captures, Regex};
use scraper::{Html, Selector};
use std::borrow::Cow;

/// Returns the text of every `<loc>` entry matching `pattern`, in document order
///
/// The sitemap is read with the lenient HTML parser, which keeps unknown
/// elements such as `<urlset>`, `<url>` and `<loc>` in the tree. CDATA
/// sections are unwrapped first, since HTML parsing would drop them as
/// comments.
///
/// # Example
///
/// ```
/// use lesson_harvest::extract::matching_locs;
/// use regex::Regex;
///
/// let xml = r#"<urlset>
///     <url><loc>https://example.com/category/finnish-verbs/</loc></url>
///     <url><loc>https://example.com/category/news/</loc></url>
/// </urlset>"#;
/// let pattern = Regex::new("^https://example.com/category/finnish-").unwrap();
/// assert_eq!(
///     matching_locs(xml, &pattern),
///     vec!["https://example.com/category/finnish-verbs/".to_string()]
/// );
/// ```
pub fn matching_locs(xml: &str, pattern: &Regex) -> Vec<String> {
    let document = Html::parse_document(&unwrap_cdata(xml));

    let Ok(loc_selector) = Selector::parse("loc") else {
        return Vec::new();
    };

    document
        .select(&loc_selector)
        .map(|loc| loc.text().collect::<String>().trim().to_string())
        .filter(|loc| !loc.is_empty() && pattern.is_match(loc))
        .collect()
}

/// Replaces each `<![CDATA[...]]>` section with its escaped text
fn unwrap_cdata(xml: &str) -> Cow<'_, str> {
    let Ok(cdata) = Regex::new(r"(?s)<!\[CDATA\[(.*?)\]\]>") else {
        return Cow::Borrowed(xml);
    };

    cdata.replace_all(xml, |caps: &Captures| {
        caps[1]
            .replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
    })
}
