// src/page/link.rs
// =============================================================================
// This module turns raw anchors into Link values.
//
// A Link is what the sitemap stores for every node:
// - url:   the normalized absolute URL (fragment removed)
// - text:  the anchor's display text ("" for the page a crawl starts from)
// - href:  the raw href attribute exactly as it appeared in the page
// - depth: how many link hops from the starting page it was discovered at
//
// It also holds the two yes/no questions the crawler asks about a link:
// - Is it something we can crawl? (http/https, not just "#section")
// - Is it on the same domain as the page that linked to it?
//
// Rust concepts:
// - Option<T>: Link::new returns None when the href can't be resolved
// - Derive macros: Serialize gives us the JSON shape for free
// =============================================================================

use serde::Serialize;
use url::{Host, Url};

use crate::error::CrawlError;

// The scheme we assume when the user types "example.com" instead of
// "http://example.com"
const DEFAULT_SCHEME: &str = "http";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub url: Url,
    pub text: String,
    pub href: String,
    pub depth: usize,
}

impl Link {
    // Builds a Link by resolving `href` against the page it was found on
    //
    // Parameters:
    //   base: URL of the page containing the anchor
    //   text: the anchor's display text
    //   href: the raw href attribute (relative or absolute)
    //   depth: depth the link is discovered at
    //
    // Returns: None when the href can't be turned into a URL at all
    //
    // Example:
    //   base = "https://example.com/blog/", href = "../about#team"
    //   url  = "https://example.com/about"
    pub fn new(base: &Url, text: &str, href: &str, depth: usize) -> Option<Link> {
        let mut url = base.join(href.trim()).ok()?;
        url.set_fragment(None);

        Some(Link {
            url,
            text: text.to_string(),
            href: href.to_string(),
            depth,
        })
    }

    // The synthetic link for the page a traversal starts from
    pub fn root(url: &Url, depth: usize) -> Link {
        let mut url = url.clone();
        url.set_fragment(None);

        Link {
            href: url.to_string(),
            url,
            text: String::new(),
            depth,
        }
    }

    // Whether this link points at a page we are willing to crawl
    //
    // We skip:
    // - "#section" links (they point back at the same page)
    // - mailto:, tel:, javascript:, data:, ftp: ... (anything not http/https)
    // - URLs without a host
    pub fn is_valid_page_link(&self) -> bool {
        let href = self.href.trim();
        if href.is_empty() || href.starts_with('#') {
            return false;
        }

        matches!(self.url.scheme(), "http" | "https") && self.url.host().is_some()
    }
}

// Whether two URLs live on the same domain
//
// Only the host is compared: scheme and port may differ
// (http://example.com and https://example.com:8443 are the same domain).
pub fn is_same_domain(a: &Url, b: &Url) -> bool {
    match (a.host_str(), b.host_str()) {
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
        _ => false,
    }
}

// Parses the target of a crawl request into a normalized URL
//
// Accepts "example.com/docs" as well as "https://example.com/docs"; the
// former gets the default http scheme.
//
// Rejects:
// - empty strings and strings containing whitespace
// - anything that doesn't parse as a URL
// - schemes other than http/https
// - single-label hosts such as "monzo" (except localhost)
pub fn parse_site_url(raw: &str) -> Result<Url, CrawlError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(CrawlError::invalid_query("site is required"));
    }

    if raw.chars().any(char::is_whitespace) {
        return Err(CrawlError::invalid_query(format!(
            "site ( {} ) is not a valid URL",
            raw
        )));
    }

    let candidate = if has_explicit_scheme(raw) {
        raw.to_string()
    } else {
        format!("{}://{}", DEFAULT_SCHEME, raw)
    };

    let mut url = Url::parse(&candidate).map_err(|e| {
        CrawlError::invalid_query(format!("site ( {} ) is not a valid URL: {}", raw, e))
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(CrawlError::invalid_query(format!(
            "site ( {} ) must use http or https",
            raw
        )));
    }

    let host_ok = match url.host() {
        Some(Host::Domain(domain)) => domain == "localhost" || domain.contains('.'),
        Some(Host::Ipv4(_)) | Some(Host::Ipv6(_)) => true,
        None => false,
    };
    if !host_ok {
        return Err(CrawlError::invalid_query(format!(
            "site ( {} ) has no valid host",
            raw
        )));
    }

    url.set_fragment(None);
    Ok(url)
}

// "mailto:x" and "https://x" carry a scheme, "localhost:8080" and
// "example.com:81/docs" are a host and a port
fn has_explicit_scheme(raw: &str) -> bool {
    if raw.contains("://") {
        return true;
    }

    match raw.split_once(':') {
        Some((scheme, rest)) => {
            !scheme.contains(['/', '.']) && !rest.starts_with(|c: char| c.is_ascii_digit())
        }
        None => false,
    }
}
