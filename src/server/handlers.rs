// src/server/handlers.rs
// =============================================================================
// The /crawl endpoint.
//
//   GET  /crawl?site=https://example.com&max_depth=3
//   POST /crawl   (form body: site=...&max_depth=...)
//
// Each request gets its own Crawler (and so its own visited cache) and is
// crawled from depth 0. The response is the sitemap as JSON:
//
//   { "data": { "url": ..., "text": "", "href": ..., "depth": 0 },
//     "site": [ ... ] }
//
// A site that isn't an HTML page comes back as its root node alone, with no
// "site" field.
// =============================================================================

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Form, Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::crawl::{CrawlQuery, Crawler, CrawlerOptions, Site};
use crate::error::CrawlError;

#[derive(Clone)]
pub struct AppState {
    pub crawler_options: CrawlerOptions,
}

// Raw request parameters
//
// max_depth is taken as a string and parsed leniently: anything that isn't a
// number means "use the default depth".
#[derive(Debug, Default, Deserialize)]
pub struct CrawlParams {
    pub site: Option<String>,
    pub max_depth: Option<String>,
}

impl CrawlParams {
    fn into_query(self) -> CrawlQuery {
        let max_depth = self
            .max_depth
            .and_then(|value| value.trim().parse::<usize>().ok())
            .unwrap_or(0);

        CrawlQuery::new(self.site.unwrap_or_default(), max_depth)
    }
}

pub struct ApiError(CrawlError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_invalid_query() {
            StatusCode::BAD_REQUEST
        } else if matches!(self.0, CrawlError::Client(_)) {
            StatusCode::INTERNAL_SERVER_ERROR
        } else {
            StatusCode::BAD_GATEWAY
        };

        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

pub async fn get_crawl(
    State(state): State<AppState>,
    Query(params): Query<CrawlParams>,
) -> Result<Json<Site>, ApiError> {
    crawl(state, params).await
}

pub async fn post_crawl(
    State(state): State<AppState>,
    Form(params): Form<CrawlParams>,
) -> Result<Json<Site>, ApiError> {
    crawl(state, params).await
}

async fn crawl(state: AppState, params: CrawlParams) -> Result<Json<Site>, ApiError> {
    let query = params.into_query();
    info!(site = %query.site, max_depth = query.max_depth, "Crawl requested");

    let crawler = Crawler::new(state.crawler_options).map_err(ApiError)?;

    match crawler.map_site(query.clone()).await {
        Ok(sitemap) => {
            info!(
                site = %query.site,
                pages = sitemap.page_count(),
                "Crawl finished"
            );
            Ok(Json(sitemap))
        }
        Err(e) => {
            error!(site = %query.site, error = %e, "Failed to crawl");
            Err(ApiError(e))
        }
    }
}
