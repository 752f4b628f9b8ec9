// src/lib.rs
// =============================================================================
// site-mapper: crawl a website and build a tree of which page links to which.
//
// The crawl only follows links that stay on the starting page's domain, stops
// at a maximum depth, and returns a `Site` tree whose children are sorted by
// link text, so the same site always maps to the same tree.
//
// Usage:
//
//   use site_mapper::crawl::{CrawlQuery, Crawler, CrawlerOptions};
//
//   let crawler = Crawler::new(CrawlerOptions::default())?;
//   let sitemap = crawler.crawl(CrawlQuery::new("https://example.com", 3), 0).await?;
//   println!("{}", serde_json::to_string_pretty(&sitemap)?);
//
// Modules:
// - crawl: the crawl engine and the sitemap tree
// - page: links, fetching and HTML link extraction for a single page
// - server: the HTTP front-end (GET/POST /crawl)
// - config / logging: environment configuration and tracing setup
// =============================================================================

pub mod config;
pub mod crawl;
pub mod error;
pub mod logging;
pub mod page;
pub mod server;

pub use error::CrawlError;
