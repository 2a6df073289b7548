// src/config.rs
// =============================================================================
// Configuration for a single crawl.
//
// CrawlConfig is what the caller hands to `crawl::run`. Once the seed URL has
// been parsed, the parts every task needs are frozen into a CrawlScope which
// is shared read-only (behind an Arc) by all tasks for the whole run.
// =============================================================================

use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Worker count used when the caller passes zero
pub const DEFAULT_MAX_WORKERS: usize = 100;

/// Standing workers kept alive by the pool, capped at the max
pub const DEFAULT_MIN_WORKERS: usize = 10;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("max_workers must be at least 1")]
    NoWorkers,

    #[error("min_workers ({min}) must be between 1 and max_workers ({max})")]
    WorkerBounds { min: usize, max: usize },

    #[error("request timeout must be greater than zero")]
    ZeroTimeout,
}

/// Everything needed to run one crawl
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// The page to start from
    pub seed_url: String,
    /// Follow links that leave the seed's host
    pub allow_external: bool,
    /// Upper bound on concurrently running crawl tasks
    pub max_workers: usize,
    /// Workers the pool keeps alive even when idle
    pub min_workers: usize,
    /// None = unlimited. Pages deeper than this are still checked, but their
    /// links are not followed.
    pub max_depth: Option<usize>,
    /// Per-request timeout for HEAD probes and page fetches
    pub request_timeout: Duration,
}

impl CrawlConfig {
    pub fn new(seed_url: impl Into<String>) -> Self {
        Self {
            seed_url: seed_url.into(),
            allow_external: false,
            max_workers: DEFAULT_MAX_WORKERS,
            min_workers: DEFAULT_MIN_WORKERS,
            max_depth: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn allow_external(mut self, allow: bool) -> Self {
        self.allow_external = allow;
        self
    }

    /// Sets the worker ceiling. The standing minimum is clamped down to it.
    pub fn max_workers(mut self, workers: usize) -> Self {
        self.max_workers = workers;
        self.min_workers = self.min_workers.min(workers.max(1));
        self
    }

    pub fn min_workers(mut self, workers: usize) -> Self {
        self.min_workers = workers;
        self
    }

    /// Negative depths mean "no limit", the same convention as the CLI
    pub fn max_depth(mut self, depth: i64) -> Self {
        self.max_depth = usize::try_from(depth).ok();
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.min_workers == 0 || self.min_workers > self.max_workers {
            return Err(ConfigError::WorkerBounds {
                min: self.min_workers,
                max: self.max_workers,
            });
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }
}

/// The read-only crawl policy shared by every task
#[derive(Debug, Clone)]
pub struct CrawlScope {
    /// The parsed seed, used as the base for relative links
    pub root: Url,
    /// host[:port] of the seed
    pub root_authority: String,
    pub allow_external: bool,
    pub max_workers: usize,
    pub max_depth: Option<usize>,
}

impl CrawlScope {
    pub fn new(root: Url, config: &CrawlConfig) -> Self {
        let root_authority = authority(&root);
        Self {
            root,
            root_authority,
            allow_external: config.allow_external,
            max_workers: config.max_workers,
            max_depth: config.max_depth,
        }
    }

    /// The path of the seed page; links that point straight back at it are skipped
    pub fn root_path(&self) -> &str {
        self.root.path()
    }

    /// Whether a task at `depth` may farm its page and schedule children
    pub fn may_expand(&self, depth: usize) -> bool {
        match self.max_depth {
            Some(max) => depth <= max,
            None => true,
        }
    }
}

/// host[:port] of a URL, or "" for URLs without a host
pub fn authority(url: &Url) -> String {
    match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{}:{}", host, port),
        (Some(host), None) => host.to_string(),
        (None, _) => String::new(),
    }
}
