// src/main.rs
// =============================================================================
// This is the entry point of the site-mapper application.
//
// What happens here:
// 1. Read configuration from the environment and set up logging
// 2. Parse command-line arguments using clap
// 3. Dispatch to the appropriate subcommand handler
// 4. Exit with proper code (0 = success, 2 = error)
// =============================================================================

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use std::time::Duration;

use cli::{Cli, Commands};
use site_mapper::config::Config;
use site_mapper::crawl::{CrawlQuery, Crawler};
use site_mapper::{logging, server};

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();
    let mut config = Config::from_env();
    logging::init_tracing(&config);

    match cli.command {
        Commands::Crawl {
            site,
            max_depth,
            max_concurrency,
            request_timeout,
            pretty,
        } => {
            if let Some(limit) = max_concurrency {
                config.max_concurrency = (limit > 0).then_some(limit);
            }
            if let Some(secs) = request_timeout {
                config.request_timeout = (secs > 0).then(|| Duration::from_secs(secs));
            }
            handle_crawl(&config, site, max_depth, pretty).await
        }
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            server::start_server(config).await?;
            Ok(0)
        }
    }
}

// Handles the 'crawl' subcommand
//
// Prints the sitemap JSON to stdout. A site that isn't an HTML page prints
// just its root node, which is still a successful crawl.
async fn handle_crawl(config: &Config, site: String, max_depth: usize, pretty: bool) -> Result<i32> {
    let query = CrawlQuery::new(site, max_depth);
    tracing::info!(
        site = %query.site,
        max_depth = query.effective_max_depth(),
        "Crawling website"
    );

    let crawler = Crawler::new(config.crawler_options())?;
    let sitemap = crawler
        .map_site(query.clone())
        .await
        .with_context(|| format!("Failed to crawl ( {} )", query.site))?;

    tracing::info!(
        pages = sitemap.page_count(),
        visited = crawler.visited_count(),
        "Crawl finished"
    );

    let json = if pretty {
        serde_json::to_string_pretty(&sitemap)?
    } else {
        serde_json::to_string(&sitemap)?
    };
    println!("{}", json);

    Ok(0)
}
