// src/crawl/mod.rs
// =============================================================================
// This module builds sitemaps by crawling a website.
//
// Features:
// - Recursive crawl starting from a URL, one concurrent task per link
// - Same-domain restriction (never leaves the starting site)
// - Configurable depth limit (default: 2)
// - Per-crawl cache so pages linked from many places are crawled once
// - Deterministic output: children are sorted by link text
//
// Submodules:
// - query: the crawl request
// - site: the sitemap tree
// - cache: pages already crawled in this session
// - crawler: the crawl itself
// =============================================================================

mod cache;
mod crawler;
mod query;
mod site;

pub use crawler::{Crawler, CrawlerOptions};
pub use query::CrawlQuery;
pub use site::Site;
