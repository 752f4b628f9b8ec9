// src/crawl/site.rs
// =============================================================================
// The sitemap tree.
//
// A Site is one crawled page plus the pages it links to, each of which is a
// Site of its own. Serialized as:
//
//   { "data": { "url": ..., "text": ..., "href": ..., "depth": ... },
//     "site": [ ...children... ] }            <- omitted when empty
//
// While a page is being crawled its children arrive from concurrent tasks in
// whatever order their fetches finish. SiteBuilder collects them behind a
// lock that belongs to that one page, and sorts them once everyone has
// reported back, so the finished tree doesn't depend on network timing.
// =============================================================================

use serde::Serialize;
use std::sync::Mutex;

use crate::page::Link;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Site {
    pub data: Link,
    #[serde(rename = "site", skip_serializing_if = "Vec::is_empty")]
    pub sites: Vec<Site>,
}

impl Site {
    pub fn new(data: Link) -> Self {
        Self {
            data,
            sites: Vec::new(),
        }
    }

    /// Number of pages in this tree, this one included
    pub fn page_count(&self) -> usize {
        1 + self.sites.iter().map(Site::page_count).sum::<usize>()
    }
}

// Sorts sites by link text ascending
//
// The sort is stable and compares the raw strings byte by byte, so "B" comes
// before "a" and siblings with equal text keep their relative order.
pub fn sort_sites(sites: &mut [Site]) {
    sites.sort_by(|a, b| a.data.text.cmp(&b.data.text));
}

// A Site whose children are still arriving
//
// Shared (behind an Arc) between the tasks crawling the page's children.
// The lock is only held for the push itself.
#[derive(Debug)]
pub struct SiteBuilder {
    data: Link,
    sites: Mutex<Vec<Site>>,
}

impl SiteBuilder {
    pub fn new(data: Link) -> Self {
        Self {
            data,
            sites: Mutex::new(Vec::new()),
        }
    }

    pub fn append_site(&self, site: Site) {
        // A poisoned lock only means another child panicked mid-push;
        // the Vec itself is still valid.
        let mut sites = self.sites.lock().unwrap_or_else(|e| e.into_inner());
        sites.push(site);
    }

    /// Freezes the node: children are sorted and the Site handed back.
    /// Call once, after every child task has finished.
    pub fn finish(&self) -> Site {
        let mut sites = {
            let mut sites = self.sites.lock().unwrap_or_else(|e| e.into_inner());
            std::mem::take(&mut *sites)
        };
        sort_sites(&mut sites);

        let mut site = Site::new(self.data.clone());
        site.sites = sites;
        site
    }
}
