// src/page/fetch.rs
// =============================================================================
// This module fetches pages over HTTP.
//
// Key functionality:
// - One GET request per page (no HEAD, we need the body anyway)
// - Anything other than 200 OK is a failed fetch
// - Decides from the Content-Type header whether a response is an HTML page
//
// The Fetcher wraps a reqwest Client. Client is cheap to clone (it's an Arc
// internally), so every crawl task shares the same connection pool.
// =============================================================================

use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use url::Url;

use crate::error::CrawlError;

pub const DEFAULT_USER_AGENT: &str = concat!("site-mapper/", env!("CARGO_PKG_VERSION"));

const HTML_CONTENT_TYPE: &str = "text/html";

#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    // Builds a fetcher with its own HTTP client
    //
    // Parameters:
    //   user_agent: sent with every request
    //   request_timeout: per-request transport timeout (None = wait forever)
    pub fn new(user_agent: &str, request_timeout: Option<Duration>) -> Result<Self, CrawlError> {
        let mut builder = Client::builder()
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::limited(5));

        if let Some(timeout) = request_timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build().map_err(CrawlError::Client)?;
        Ok(Self { client })
    }

    // Wraps an already configured client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    // Performs one GET request
    //
    // Returns the response with its body still unread, so the caller can look
    // at the headers first and skip reading bodies it doesn't care about.
    pub async fn fetch(&self, url: &Url) -> Result<Response, CrawlError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| CrawlError::Request {
                url: url.to_string(),
                source,
            })?;

        // Only the lowest success code counts: 201, 204, 206... are failures too
        let status = response.status();
        if status != StatusCode::OK {
            return Err(CrawlError::Status {
                url: url.to_string(),
                status,
            });
        }

        Ok(response)
    }
}

// Checks whether a response is an HTML page worth parsing
//
// "text/html" and "text/html; charset=utf-8" both count.
pub fn is_webpage(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|content_type| {
            content_type == HTML_CONTENT_TYPE
                || content_type.to_ascii_lowercase().contains(HTML_CONTENT_TYPE)
        })
}
