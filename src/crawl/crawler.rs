// src/crawl/crawler.rs
// =============================================================================
// This module implements the recursive, concurrent sitemap crawl.
//
// How it works, for one page at depth D:
// 1. Stop (empty result, no error) if D has reached the depth bound
// 2. Validate the query's URL
// 3. Return the cached subtree if this URL was already crawled
// 4. Fetch the page; a failed fetch fails this branch only
// 5. Stop (empty result, no error) if the response isn't HTML
// 6. Extract the same-domain links, tagged with depth D + 1
// 7. Spawn one task per link, each crawling that link at depth D + 1
// 8. Wait for every task; each successful child is labelled with the anchor
//    that found it and appended to this page's node
// 9. Sort the children by text, cache the subtree, return it
//
// A child's failure is logged and the child left out. It never fails the
// parent, so a crawl only errors when the starting page itself can't be
// crawled.
//
// Concurrency:
// - Unbounded by default: every link gets its own task straight away
// - CrawlerOptions::max_concurrency caps how many fetches run at once. The
//   permit covers the fetch only, never the recursive crawl of the children,
//   so a parent waiting on its children can't starve them.
// =============================================================================

use futures::future::{BoxFuture, FutureExt};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use url::Url;

use super::cache::VisitedCache;
use super::query::CrawlQuery;
use super::site::{Site, SiteBuilder};
use crate::error::CrawlError;
use crate::page::{extract_links, is_webpage, Fetcher, Link, DEFAULT_USER_AGENT};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct CrawlerOptions {
    /// User-Agent header sent with every request
    pub user_agent: String,
    /// Transport timeout for a single request (None = no timeout)
    pub request_timeout: Option<Duration>,
    /// Maximum number of fetches in flight at once (None = unbounded)
    pub max_concurrency: Option<usize>,
    /// Use this client instead of building one from the options above
    pub client: Option<Client>,
}

impl Default for CrawlerOptions {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout: Some(DEFAULT_REQUEST_TIMEOUT),
            max_concurrency: None,
            client: None,
        }
    }
}

impl CrawlerOptions {
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = Some(max_concurrency);
        self
    }
}

// What happened when we visited one URL
//
// Callers only see Option<Site>: both stop outcomes become None. The
// distinction is kept here so the logs can tell them apart.
#[derive(Debug)]
enum Visit {
    DepthExceeded,
    NotWebpage,
    Crawled(Site),
}

impl Visit {
    fn into_site(self) -> Option<Site> {
        match self {
            Visit::Crawled(site) => Some(site),
            Visit::DepthExceeded | Visit::NotWebpage => None,
        }
    }
}

// One crawl session
//
// Cloning is cheap and every clone shares the same cache, so a Crawler is
// meant to be created per top-level crawl and dropped with it.
#[derive(Debug, Clone)]
pub struct Crawler {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    fetcher: Fetcher,
    visited: VisitedCache,
    limiter: Option<Semaphore>,
}

impl Crawler {
    pub fn new(options: CrawlerOptions) -> Result<Self, CrawlError> {
        let fetcher = match options.client {
            Some(client) => Fetcher::with_client(client),
            None => Fetcher::new(&options.user_agent, options.request_timeout)?,
        };

        // A limit of 0 would never hand out a permit
        let limiter = options
            .max_concurrency
            .map(|permits| Semaphore::new(permits.max(1)));

        Ok(Self {
            inner: Arc::new(Inner {
                fetcher,
                visited: VisitedCache::new(),
                limiter,
            }),
        })
    }

    // Crawls the site described by `query`, starting at `depth`
    //
    // Returns:
    //   Ok(Some(site)) = the page and everything crawled below it
    //   Ok(None)       = nothing to show: depth bound reached or not an HTML page
    //   Err(e)         = the page itself couldn't be crawled
    //
    // The future is boxed because the crawl recurses through it, and 'static
    // so children can run as their own tokio tasks.
    pub fn crawl(
        &self,
        query: CrawlQuery,
        depth: usize,
    ) -> BoxFuture<'static, Result<Option<Site>, CrawlError>> {
        let crawler = self.clone();
        async move { crawler.visit(query, depth).await.map(Visit::into_site) }.boxed()
    }

    // Crawls a whole site from its root
    //
    // Unlike crawl(), there is always a sitemap to return: a root that isn't
    // an HTML page maps to a single node with no children.
    //
    // Example:
    //   site = "https://monzo.com/logo.png"
    //   result = Site { data: Link { url: "https://monzo.com/logo.png", text: "", depth: 0, .. }, sites: [] }
    pub async fn map_site(&self, query: CrawlQuery) -> Result<Site, CrawlError> {
        let url = query.validate()?;
        let sitemap = self.crawl(query, 0).await?;
        Ok(sitemap.unwrap_or_else(|| Site::new(Link::root(&url, 0))))
    }

    pub fn get_site_from_cache(&self, url: &Url) -> Option<Site> {
        self.inner.visited.get(url.as_str())
    }

    pub fn put_site_to_cache(&self, url: &Url, site: Site) {
        self.inner.visited.put(url.as_str(), site);
    }

    /// Number of distinct pages crawled so far by this session
    pub fn visited_count(&self) -> usize {
        self.inner.visited.count()
    }

    async fn visit(&self, query: CrawlQuery, depth: usize) -> Result<Visit, CrawlError> {
        let max_depth = query.effective_max_depth();
        if depth >= max_depth {
            tracing::debug!(depth, max_depth, "Depth reached threshold. Stopping.");
            return Ok(Visit::DepthExceeded);
        }

        let url = query.validate()?;
        tracing::debug!(%url, depth, "URL to be crawled");

        if let Some(site) = self.get_site_from_cache(&url) {
            tracing::debug!(%url, "Already visited. Using cached sitemap");
            return Ok(Visit::Crawled(site));
        }

        let Some(body) = self.fetch_page(&url).await? else {
            tracing::debug!(%url, "Not a webpage. Do not crawl");
            return Ok(Visit::NotWebpage);
        };

        let links = extract_links(&url, &body, depth + 1);
        drop(body);
        tracing::debug!(%url, links = links.len(), "Extracted links");

        let builder = Arc::new(SiteBuilder::new(Link::root(&url, depth)));
        let mut tasks = JoinSet::new();

        for link in links {
            let crawler = self.clone();
            let builder = Arc::clone(&builder);
            let child_query = query.child(&link.url);

            tasks.spawn(async move {
                tracing::info!(url = %link.url, text = %link.text, depth = link.depth, "Crawling link");

                match crawler.crawl(child_query, depth + 1).await {
                    Ok(Some(mut site)) => {
                        // Label the child with the anchor that led here, not
                        // with whatever the child resolved for itself
                        site.data = link;
                        builder.append_site(site);
                    }
                    Ok(None) => {}
                    Err(e) => {
                        tracing::error!(url = %link.url, error = %e, "Failed to crawl");
                    }
                }
            });
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::error!(%url, error = %e, "Crawl task did not finish");
            }
        }

        let site = builder.finish();
        self.put_site_to_cache(&url, site.clone());

        Ok(Visit::Crawled(site))
    }

    // Fetches a page and returns its body, or None when it isn't HTML
    //
    // Holds a concurrency permit (when limited) until the body is read.
    async fn fetch_page(&self, url: &Url) -> Result<Option<String>, CrawlError> {
        let _permit = match &self.inner.limiter {
            Some(limiter) => limiter.acquire().await.ok(),
            None => None,
        };

        let response = self.inner.fetcher.fetch(url).await?;
        tracing::debug!(%url, status = %response.status(), "Response");

        if !is_webpage(response.headers()) {
            // Drain the body so the connection can go back to the pool
            if let Err(e) = response.bytes().await {
                tracing::debug!(%url, error = %e, "Failed to drain response body");
            }
            return Ok(None);
        }

        let body = response.text().await.map_err(|source| CrawlError::Body {
            url: url.to_string(),
            source,
        })?;

        Ok(Some(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use httpmock::Mock;

    fn crawler() -> Crawler {
        Crawler::new(CrawlerOptions::default()).unwrap()
    }

    fn texts(site: &Site) -> Vec<&str> {
        site.sites.iter().map(|s| s.data.text.as_str()).collect()
    }

    // Serves an HTML page at `path` whose body is the given anchors
    async fn page<'a>(server: &'a MockServer, path: &str, anchors: &[(&str, &str)]) -> Mock<'a> {
        page_with_delay(server, path, anchors, Duration::ZERO).await
    }

    async fn page_with_delay<'a>(
        server: &'a MockServer,
        path: &str,
        anchors: &[(&str, &str)],
        delay: Duration,
    ) -> Mock<'a> {
        let body = anchors
            .iter()
            .map(|(href, text)| format!(r#"<a href="{}">{}</a>"#, href, text))
            .collect::<Vec<_>>()
            .join("\n");
        let body = format!("<html><body>{}</body></html>", body);

        server
            .mock_async(|when, then| {
                when.method(GET).path(path.to_string());
                then.status(200)
                    .header("content-type", "text/html; charset=utf-8")
                    .delay(delay)
                    .body(body);
            })
            .await
    }

    #[tokio::test]
    async fn test_depth_exceeded() {
        let query = CrawlQuery::new("", 1);
        assert!(crawler().crawl(query, 2).await.unwrap().is_none());

        // Default bound is 2, regardless of how bad the URL is
        let query = CrawlQuery::new("invalid site", 0);
        assert!(crawler().crawl(query, 2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalid_query_site() {
        for site in ["invalid site", "", "monzo", "ftp://monzo.com"] {
            let err = crawler().crawl(CrawlQuery::new(site, 0), 0).await.unwrap_err();
            assert!(err.is_invalid_query(), "site: {:?}", site);
        }
    }

    #[tokio::test]
    async fn test_fetch_empty_page() {
        let server = MockServer::start_async().await;
        page(&server, "/", &[]).await;

        let site = crawler()
            .crawl(CrawlQuery::new(server.url("/"), 0), 0)
            .await
            .unwrap()
            .unwrap();

        let url = Url::parse(&server.url("/")).unwrap();
        assert_eq!(site.data, Link::root(&url, 0));
        assert!(site.sites.is_empty());
    }

    #[tokio::test]
    async fn test_root_fetch_failure_is_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/");
                then.status(404);
            })
            .await;

        let err = crawler()
            .crawl(CrawlQuery::new(server.url("/"), 0), 0)
            .await
            .unwrap_err();
        assert!(matches!(err, CrawlError::Status { .. }));
    }

    #[tokio::test]
    async fn test_not_a_webpage() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/data.json");
                then.status(200)
                    .header("content-type", "application/json")
                    .body(r#"{"links": "<a href=\"/x\">x</a>"}"#);
            })
            .await;

        let crawler = crawler();
        let result = crawler
            .crawl(CrawlQuery::new(server.url("/data.json"), 0), 0)
            .await
            .unwrap();

        assert!(result.is_none());
        assert_eq!(crawler.visited_count(), 0);
    }

    #[tokio::test]
    async fn test_crawl_mock_0() {
        // { 0: { 01: { 011, 012 } } }
        let server = MockServer::start_async().await;
        page(&server, "/", &[("/01", "01")]).await;
        page(&server, "/01", &[("/011", "011"), ("/012", "012")]).await;
        page(&server, "/011", &[]).await;
        page(&server, "/012", &[]).await;

        let root_url = Url::parse(&server.url("/")).unwrap();
        let site = crawler()
            .crawl(CrawlQuery::new(root_url.as_str(), 3), 0)
            .await
            .unwrap()
            .unwrap();

        let expected = Site {
            data: Link::root(&root_url, 0),
            sites: vec![Site {
                data: Link::new(&root_url, "01", "/01", 1).unwrap(),
                sites: vec![
                    Site::new(Link::new(&root_url, "011", "/011", 2).unwrap()),
                    Site::new(Link::new(&root_url, "012", "/012", 2).unwrap()),
                ],
            }],
        };
        assert_eq!(site, expected);
    }

    #[tokio::test]
    async fn test_depth_bound_leaves_out_truncated_pages() {
        let server = MockServer::start_async().await;
        page(&server, "/", &[("/01", "01")]).await;
        page(&server, "/01", &[("/011", "011")]).await;
        page(&server, "/011", &[]).await;

        let site = crawler()
            .crawl(CrawlQuery::new(server.url("/"), 2), 0)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(texts(&site), vec!["01"]);
        assert!(site.sites[0].sites.is_empty());
    }

    #[tokio::test]
    async fn test_children_sorted_despite_staggered_latency() {
        let server = MockServer::start_async().await;
        page(&server, "/", &[("/b", "b"), ("/a", "a"), ("/c", "c")]).await;
        page_with_delay(&server, "/b", &[], Duration::from_millis(300)).await;
        page_with_delay(&server, "/a", &[], Duration::from_millis(150)).await;
        page(&server, "/c", &[]).await;

        let site = crawler()
            .crawl(CrawlQuery::new(server.url("/"), 0), 0)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(texts(&site), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_failed_child_is_omitted() {
        let server = MockServer::start_async().await;
        page(&server, "/", &[("/ok", "ok"), ("/missing", "missing"), ("/image", "image")]).await;
        page(&server, "/ok", &[]).await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/missing");
                then.status(404);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/image");
                then.status(200).header("content-type", "image/png").body("png");
            })
            .await;

        let site = crawler()
            .crawl(CrawlQuery::new(server.url("/"), 0), 0)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(texts(&site), vec!["ok"]);
    }

    #[tokio::test]
    async fn test_diamond_shares_identical_subtree() {
        // A -> B, A -> C, B -> D, C -> D
        let server = MockServer::start_async().await;
        page(&server, "/", &[("/b", "B"), ("/c", "C")]).await;
        page(&server, "/b", &[("/d", "D")]).await;
        page(&server, "/c", &[("/d", "D")]).await;
        page(&server, "/d", &[("/e", "E")]).await;
        page(&server, "/e", &[]).await;

        let site = crawler()
            .crawl(CrawlQuery::new(server.url("/"), 4), 0)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(texts(&site), vec!["B", "C"]);
        let b = &site.sites[0];
        let c = &site.sites[1];
        assert_eq!(texts(b), vec!["D"]);
        assert_eq!(b.sites, c.sites);
        assert_eq!(texts(&b.sites[0]), vec!["E"]);
    }

    #[tokio::test]
    async fn test_same_site_twice_is_identical() {
        let server = MockServer::start_async().await;
        page(&server, "/", &[("/z", "z"), ("/x", "x"), ("/y", "y")]).await;
        page_with_delay(&server, "/x", &[("/x2", "x2"), ("/x1", "x1")], Duration::from_millis(50)).await;
        page(&server, "/y", &[]).await;
        page_with_delay(&server, "/z", &[("/z1", "z1")], Duration::from_millis(20)).await;
        page_with_delay(&server, "/x1", &[], Duration::from_millis(30)).await;
        page(&server, "/x2", &[]).await;
        page(&server, "/z1", &[]).await;

        let query = CrawlQuery::new(server.url("/"), 3);
        let first = crawler().crawl(query.clone(), 0).await.unwrap().unwrap();
        let second = crawler().crawl(query, 0).await.unwrap().unwrap();

        assert_eq!(first, second);
        assert_eq!(texts(&first), vec!["x", "y", "z"]);
        assert_eq!(texts(&first.sites[0]), vec!["x1", "x2"]);
        assert_eq!(first.page_count(), 7);
    }

    #[tokio::test]
    async fn test_visited_page_comes_from_cache() {
        let server = MockServer::start_async().await;
        let home = page(&server, "/", &[]).await;

        let crawler = crawler();
        let query = CrawlQuery::new(server.url("/"), 0);
        let first = crawler.crawl(query.clone(), 0).await.unwrap();
        let second = crawler.crawl(query, 0).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(crawler.visited_count(), 1);
        home.assert_async().await;
    }

    #[tokio::test]
    async fn test_custom_http_client() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/").header("user-agent", "custom-agent");
                then.status(200).header("content-type", "text/html").body("<html></html>");
            })
            .await;

        let client = Client::builder().user_agent("custom-agent").build().unwrap();
        let crawler = Crawler::new(CrawlerOptions::default().with_client(client)).unwrap();
        let site = crawler.crawl(CrawlQuery::new(server.url("/"), 0), 0).await.unwrap();

        assert!(site.is_some());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_cross_domain_links_are_not_followed() {
        let server = MockServer::start_async().await;
        page(
            &server,
            "/",
            &[("/local", "local"), ("https://elsewhere.example.org/", "elsewhere")],
        )
        .await;
        page(&server, "/local", &[]).await;

        let site = crawler()
            .crawl(CrawlQuery::new(server.url("/"), 0), 0)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(texts(&site), vec!["local"]);
    }

    #[tokio::test]
    async fn test_map_site_non_html_root_is_single_node() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/logo.png");
                then.status(200).header("content-type", "image/png").body("png");
            })
            .await;

        let url = Url::parse(&server.url("/logo.png")).unwrap();
        let site = crawler()
            .map_site(CrawlQuery::new(url.as_str(), 0))
            .await
            .unwrap();

        assert_eq!(site, Site::new(Link::root(&url, 0)));
    }

    #[tokio::test]
    async fn test_map_site_invalid_query() {
        let err = crawler()
            .map_site(CrawlQuery::new("invalid site", 0))
            .await
            .unwrap_err();
        assert!(err.is_invalid_query());
    }

    #[tokio::test]
    async fn test_concurrency_limit_serializes_fetches() {
        let delay = Duration::from_millis(100);
        let server = MockServer::start_async().await;
        page(&server, "/", &[("/1", "1"), ("/2", "2"), ("/3", "3"), ("/4", "4")]).await;
        for path in ["/1", "/2", "/3", "/4"] {
            page_with_delay(&server, path, &[], delay).await;
        }

        let crawler = Crawler::new(CrawlerOptions::default().with_max_concurrency(1)).unwrap();
        let started = std::time::Instant::now();
        let site = crawler
            .crawl(CrawlQuery::new(server.url("/"), 0), 0)
            .await
            .unwrap()
            .unwrap();

        // One fetch at a time: the four delayed pages can't overlap
        assert!(started.elapsed() >= delay * 4, "elapsed: {:?}", started.elapsed());
        assert_eq!(texts(&site), vec!["1", "2", "3", "4"]);
    }

    #[tokio::test]
    async fn test_bounded_concurrency_crawls_everything() {
        let server = MockServer::start_async().await;
        page(&server, "/", &[("/1", "1"), ("/2", "2"), ("/3", "3"), ("/4", "4")]).await;
        for path in ["/1", "/2", "/3", "/4"] {
            page_with_delay(&server, path, &[("/", "home")], Duration::from_millis(20)).await;
        }

        let crawler = Crawler::new(CrawlerOptions::default().with_max_concurrency(1)).unwrap();
        let site = crawler
            .crawl(CrawlQuery::new(server.url("/"), 3), 0)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(texts(&site), vec!["1", "2", "3", "4"]);
        for child in &site.sites {
            assert_eq!(texts(child), vec!["home"]);
        }
    }
}
