// src/page/html.rs
// =============================================================================
// This module extracts the links a crawl should follow from an HTML page.
//
// We use the `scraper` crate to parse the HTML and find every <a> tag, then
// apply the crawl policy on top of what the parser gives us:
// - anchors without display text are skipped
// - anchors without an href are skipped
// - links that aren't crawlable pages are skipped (see Link::is_valid_page_link)
// - links to other domains are skipped
// - each target URL is kept once per page: the first anchor pointing at it wins
// =============================================================================

use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

use super::link::{is_same_domain, Link};

// Extracts the same-domain links of one page
//
// Parameters:
//   page_url: URL of the page the HTML came from (base for relative hrefs)
//   html: the page body
//   depth: depth to tag the links with (the page's depth + 1)
//
// Returns: Vec<Link> in document order, one entry per target URL
//
// Example:
//   page_url = "https://monzo.com"
//   html = <a href="/1">1</a> <a href="https://mondo.com">mondo</a>
//   result = [Link { url: "https://monzo.com/1", text: "1", .. }]
pub fn extract_links(page_url: &Url, html: &str, depth: usize) -> Vec<Link> {
    let mut links = Vec::new();
    let mut seen = HashSet::new();

    let document = Html::parse_document(html);
    let selector = Selector::parse("a").expect("'a' is a valid selector");

    for anchor in document.select(&selector) {
        // Each text node trimmed, blank ones dropped, the rest joined by a space
        let text = anchor
            .text()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if text.is_empty() {
            continue;
        }

        let href = anchor.value().attr("href").unwrap_or_default();
        if href.trim().is_empty() {
            continue;
        }

        let Some(link) = Link::new(page_url, &text, href, depth) else {
            tracing::debug!(%href, "Unresolvable href. Do not crawl");
            continue;
        };

        if !link.is_valid_page_link() {
            tracing::debug!(%href, "Not a page link. Do not crawl");
            continue;
        }

        if !is_same_domain(page_url, &link.url) {
            tracing::debug!(%href, "Out of domain. Do not crawl");
            continue;
        }

        if seen.insert(link.url.to_string()) {
            tracing::debug!(url = %link.url, "Link to be crawled");
            links.push(link);
        }
    }

    links
}
