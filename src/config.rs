// src/config.rs
// =============================================================================
// Runtime configuration read from the environment.
//
// Variables:
//   SITE_MAPPER_HOST             address the server binds to (default 0.0.0.0)
//   PORT                         port the server binds to (default 8080)
//   RUST_LOG / SITE_MAPPER_LOG_LEVEL
//                                tracing filter (default site_mapper=info,tower_http=info)
//   SITE_MAPPER_LOG_FORMAT       "text" or "json" (default text)
//   SITE_MAPPER_MAX_CONCURRENCY  cap on in-flight fetches (default unbounded)
//   SITE_MAPPER_REQUEST_TIMEOUT  per-request timeout in seconds (default 10, 0 = none)
//
// Command-line flags override these (see cli.rs).
// =============================================================================

use std::env;
use std::time::Duration;

use crate::crawl::CrawlerOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub max_concurrency: Option<usize>,
    pub request_timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_level: "site_mapper=info,tower_http=info".to_string(),
            log_format: LogFormat::Text,
            max_concurrency: None,
            request_timeout: Some(Duration::from_secs(10)),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(host) = env::var("SITE_MAPPER_HOST") {
            config.host = host;
        }

        if let Ok(port_str) = env::var("PORT") {
            if let Ok(port) = port_str.parse::<u16>() {
                config.port = port;
            } else {
                eprintln!(
                    "Warning: Invalid PORT value '{}', using default {}",
                    port_str, config.port
                );
            }
        }

        if let Ok(log_level) = env::var("RUST_LOG") {
            config.log_level = log_level;
        } else if let Ok(log_level) = env::var("SITE_MAPPER_LOG_LEVEL") {
            config.log_level = log_level;
        }

        if let Ok(log_format) = env::var("SITE_MAPPER_LOG_FORMAT") {
            config.log_format = match log_format.to_lowercase().as_str() {
                "text" | "plain" => LogFormat::Text,
                "json" => LogFormat::Json,
                _ => {
                    eprintln!(
                        "Warning: Invalid SITE_MAPPER_LOG_FORMAT value '{}', using default text",
                        log_format
                    );
                    LogFormat::Text
                }
            };
        }

        if let Ok(value) = env::var("SITE_MAPPER_MAX_CONCURRENCY") {
            match value.parse::<usize>() {
                Ok(0) => config.max_concurrency = None,
                Ok(limit) => config.max_concurrency = Some(limit),
                Err(_) => eprintln!(
                    "Warning: Invalid SITE_MAPPER_MAX_CONCURRENCY value '{}', crawling unbounded",
                    value
                ),
            }
        }

        if let Ok(value) = env::var("SITE_MAPPER_REQUEST_TIMEOUT") {
            match value.parse::<u64>() {
                Ok(0) => config.request_timeout = None,
                Ok(secs) => config.request_timeout = Some(Duration::from_secs(secs)),
                Err(_) => eprintln!(
                    "Warning: Invalid SITE_MAPPER_REQUEST_TIMEOUT value '{}', using default 10s",
                    value
                ),
            }
        }

        config
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn crawler_options(&self) -> CrawlerOptions {
        CrawlerOptions {
            max_concurrency: self.max_concurrency,
            request_timeout: self.request_timeout,
            ..Default::default()
        }
    }
}
