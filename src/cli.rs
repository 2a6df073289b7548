// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Every flag can also be set through an environment variable (clap's `env`
// feature), which is handy in CI where the command line is fixed:
//
//   SPIDER_URL=https://example.com SPIDER_WORKERS=50 deadlink-spider
//
// Flags win over environment variables, and environment variables win over
// the defaults.
// =============================================================================

use clap::Parser;
use std::time::Duration;

use deadlink_spider::config::{CrawlConfig, DEFAULT_MAX_WORKERS};

#[derive(Parser, Debug)]
#[command(
    name = "deadlink-spider",
    version,
    about = "Crawl a website and report every dead link",
    long_about = "deadlink-spider starts at a URL, follows every href and src it finds on \
                  the same host, and reports each link that fails to load. It exits with \
                  status 1 when dead links were found, so it drops straight into CI."
)]
pub struct Cli {
    /// URL to crawl for dead links
    ///
    /// Example: deadlink-spider https://golang.org
    #[arg(env = "SPIDER_URL")]
    pub url: String,

    /// Maximum workers used for crawling pages (0 or less means 100)
    #[arg(short, long, env = "SPIDER_WORKERS", default_value_t = 100, allow_negative_numbers = true)]
    pub workers: i64,

    /// Workers kept alive even while idle (capped at --workers)
    #[arg(long, env = "SPIDER_MIN_WORKERS", default_value_t = 10)]
    pub min_workers: usize,

    /// Also check links that leave the starting host
    #[arg(short, long, env = "SPIDER_EXTERNAL")]
    pub external: bool,

    /// Per-request timeout in seconds
    #[arg(short, long, env = "SPIDER_TIMEOUT", default_value_t = 30)]
    pub timeout: u64,

    /// How many link hops to follow from the starting page (-1 = no limit)
    ///
    /// Depth 0 = check the links on the starting page only
    /// Depth 1 = also check the links on the pages it links to
    /// etc.
    #[arg(short = 'd', long, env = "SPIDER_MAX_DEPTH", default_value_t = -1, allow_negative_numbers = true)]
    pub max_depth: i64,

    /// Output results in JSON format instead of a table
    #[arg(long)]
    pub json: bool,

    /// Show debug logging (RUST_LOG overrides this)
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn to_config(&self) -> CrawlConfig {
        let max_workers = usize::try_from(self.workers)
            .ok()
            .filter(|&w| w > 0)
            .unwrap_or(DEFAULT_MAX_WORKERS);

        CrawlConfig::new(self.url.clone())
            .allow_external(self.external)
            .max_workers(max_workers)
            .min_workers(self.min_workers.clamp(1, max_workers))
            .max_depth(self.max_depth)
            .request_timeout(Duration::from_secs(self.timeout))
    }
}
