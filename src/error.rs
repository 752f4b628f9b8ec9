// src/error.rs
// =============================================================================
// Errors produced by the crawl engine.
//
// Every variant aborts exactly one branch of the crawl. A parent traversal
// logs its children's errors and carries on, so only the error of the root
// call ever reaches the user.
//
// "Stop here" outcomes (depth exceeded, not an HTML page) are NOT errors and
// have no variant here.
// =============================================================================

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CrawlError {
    /// The query's target is missing or is not a well-formed http(s) URL
    #[error("query is not valid: {0}")]
    InvalidQuery(String),

    /// The request never produced a response (DNS, connect, TLS, timeout...)
    #[error("failed to fetch page ({url}): {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with anything other than 200 OK
    #[error("failed to fetch page ({url}): response status code = {status}")]
    Status { url: String, status: StatusCode },

    /// The response body could not be read as text
    #[error("failed to read page body ({url}): {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The HTTP client itself could not be built
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl CrawlError {
    pub fn invalid_query(message: impl Into<String>) -> Self {
        CrawlError::InvalidQuery(message.into())
    }

    /// True when the error was caused by the caller's input rather than the site
    pub fn is_invalid_query(&self) -> bool {
        matches!(self, CrawlError::InvalidQuery(_))
    }
}
