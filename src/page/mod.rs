// src/page/mod.rs
// =============================================================================
// Everything the crawler needs to know about a single page.
//
// Submodules:
// - link: Link values, URL validation and the same-domain check
// - fetch: Fetching a page over HTTP and deciding if it is HTML
// - html: Extracting the links a crawl should follow from a page
// =============================================================================

mod fetch;
mod html;
mod link;

pub use fetch::{is_webpage, Fetcher, DEFAULT_USER_AGENT};
pub use html::extract_links;
pub use link::{parse_site_url, Link};
