// src/crawl/cache.rs
// =============================================================================
// Pages already crawled during one crawl, keyed by normalized URL.
//
// Several branches of a site often link to the same page (think "Home" or
// "About" in a nav bar). Once that page's subtree is finished it goes in
// here, and later visits reuse it instead of fetching again.
//
// This is best effort only. Two branches that reach the same page before
// either has finished will both crawl it, and whichever finishes last is the
// value left in the cache.
// =============================================================================

use std::collections::HashMap;
use std::sync::Mutex;

use super::site::Site;

#[derive(Debug, Default)]
pub struct VisitedCache {
    sites: Mutex<HashMap<String, Site>>,
}

impl VisitedCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, url: &str) -> Option<Site> {
        let sites = self.sites.lock().unwrap_or_else(|e| e.into_inner());
        sites.get(url).cloned()
    }

    /// Stores a finished subtree, replacing whatever was there
    pub fn put(&self, url: &str, site: Site) {
        let mut sites = self.sites.lock().unwrap_or_else(|e| e.into_inner());
        sites.insert(url.to_string(), site);
    }

    /// Number of URLs cached
    pub fn count(&self) -> usize {
        self.sites.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}
