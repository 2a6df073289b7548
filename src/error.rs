// src/error.rs
// =============================================================================
// Errors that abort a whole crawl.
//
// Per-link problems (404s, timeouts, pages we can't farm) are NOT errors in
// this sense: they turn into LinkReport values (see report.rs) and the crawl
// keeps going. Only the things below stop `crawl::run` before or while it
// starts up.
// =============================================================================

use thiserror::Error;

use crate::config::ConfigError;
use crate::pool::PoolError;

#[derive(Debug, Error)]
pub enum CrawlError {
    /// The seed URL could not be parsed at all
    #[error("invalid seed URL '{url}': {source}")]
    InvalidSeed {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The seed parsed but we can't crawl it (mailto:, file:, ...)
    #[error("seed URL '{0}' must use http or https")]
    UnsupportedSeedScheme(String),

    #[error("invalid crawl configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to create worker pool: {0}")]
    Pool(#[from] PoolError),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    /// The task collecting dead link reports died
    #[error("dead link collector failed: {0}")]
    Collector(#[from] tokio::task::JoinError),
}
