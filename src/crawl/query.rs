// src/crawl/query.rs
// =============================================================================
// The crawl request: which site, how deep.
// =============================================================================

use serde::Deserialize;
use url::Url;

use crate::error::CrawlError;
use crate::page::parse_site_url;

pub const DEFAULT_MAX_DEPTH: usize = 2;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CrawlQuery {
    /// URL of the page to crawl. Required.
    #[serde(default)]
    pub site: String,

    /// Depth bound. 0 means "use the default" (2).
    #[serde(default)]
    pub max_depth: usize,

    /// Accepted and carried along, but the crawler does not enforce it.
    /// Request timeouts are configured on the HTTP client instead.
    #[serde(default)]
    pub timeout: Option<u64>,
}

impl CrawlQuery {
    pub fn new(site: impl Into<String>, max_depth: usize) -> Self {
        Self {
            site: site.into(),
            max_depth,
            timeout: None,
        }
    }

    /// Depth bound with the default applied
    pub fn effective_max_depth(&self) -> usize {
        if self.max_depth == 0 {
            DEFAULT_MAX_DEPTH
        } else {
            self.max_depth
        }
    }

    /// Checks the query and returns the normalized URL it targets
    pub fn validate(&self) -> Result<Url, CrawlError> {
        parse_site_url(&self.site)
    }

    /// The query for a page discovered by this one. Depth bound is inherited.
    pub fn child(&self, site: &Url) -> Self {
        Self {
            site: site.to_string(),
            max_depth: self.max_depth,
            timeout: None,
        }
    }
}
