// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Two subcommands:
// - crawl: crawl a site once and print its sitemap as JSON
// - serve: run the HTTP server that crawls sites on request
// =============================================================================

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "site-mapper",
    version,
    about = "Maps the same-domain link tree of a website",
    long_about = "site-mapper crawls a website from a starting URL, follows the links that stay on \
                  the same domain up to a maximum depth, and produces a sitemap tree of which page \
                  links to which."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl a website and print its sitemap as JSON
    ///
    /// Example: site-mapper crawl https://example.com --max-depth 3
    Crawl {
        /// Website URL to crawl (e.g., https://example.com)
        site: String,

        /// Maximum crawl depth (0 = default of 2)
        ///
        /// Depth 1 = just the starting page
        /// Depth 2 = starting page + the pages it links to
        /// etc.
        #[arg(long, default_value_t = 0)]
        max_depth: usize,

        /// Maximum number of pages fetched at the same time (default: unbounded)
        #[arg(long)]
        max_concurrency: Option<usize>,

        /// Per-request timeout in seconds (0 = no timeout)
        #[arg(long)]
        request_timeout: Option<u64>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Run the HTTP server exposing GET/POST /crawl
    ///
    /// Example: site-mapper serve --port 8080
    Serve {
        /// Address to bind to (overrides SITE_MAPPER_HOST)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides PORT)
        #[arg(long)]
        port: Option<u16>,
    },
}
