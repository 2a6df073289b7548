// src/crawl/coordinator.rs
// =============================================================================
// `run`: crawl a site and collect its dead links.
//
// How it works:
// 1. Parse the seed URL (a bad seed is the only input error we return)
// 2. HEAD the seed ourselves. Dead seed -> that's the whole report.
// 3. Start the worker pool and a collector task that drains the dead-link
//    channel into a Vec
// 4. Schedule the seed task and wait for the pending count to hit zero
// 5. Shut the pool down, drop the last sender so the channel closes, and
//    take the collected reports from the collector
// =============================================================================

use std::sync::Arc;
use tokio::sync::mpsc;
use url::Url;

use super::pending::PendingCount;
use super::task::{CrawlContext, CrawlTask};
use super::visited::VisitedSet;
use crate::checker::{evaluate_path, HttpClient};
use crate::config::{CrawlConfig, CrawlScope};
use crate::error::CrawlError;
use crate::events::EventSink;
use crate::pool::{PoolConfig, WorkerPool};
use crate::report::LinkReport;

const CONTEXT: &str = "spider";
const EVENT: &str = "Run";

/// Small on purpose: if the collector falls behind, tasks wait on it
const DEAD_LINK_BUFFER: usize = 16;

/// Crawls everything reachable from `config.seed_url` and returns the dead
/// links found, in the order they were reported.
///
/// Finding dead links is a normal outcome. An Err means the crawl could not
/// run at all.
pub async fn run(
    config: &CrawlConfig,
    events: Arc<dyn EventSink>,
) -> Result<Vec<LinkReport>, CrawlError> {
    events.event(
        CONTEXT,
        EVENT,
        format_args!(
            "Started : URL[{}] : Include Externals[{}] : Workers[{}] : HTTPTimeout[{:?}]",
            config.seed_url, config.allow_external, config.max_workers, config.request_timeout
        ),
    );

    let result = crawl(config, &events).await;

    match &result {
        Ok(reports) => events.event(
            CONTEXT,
            EVENT,
            format_args!("Completed : Total Dead Links[{}]", reports.len()),
        ),
        Err(e) => events.error_event(CONTEXT, EVENT, e, format_args!("Completed")),
    }

    result
}

async fn crawl(
    config: &CrawlConfig,
    events: &Arc<dyn EventSink>,
) -> Result<Vec<LinkReport>, CrawlError> {
    let root = Url::parse(&config.seed_url).map_err(|source| CrawlError::InvalidSeed {
        url: config.seed_url.clone(),
        source,
    })?;
    if !matches!(root.scheme(), "http" | "https") {
        return Err(CrawlError::UnsupportedSeedScheme(config.seed_url.clone()));
    }
    config.validate()?;

    let client = HttpClient::new(config.request_timeout)?;

    // The seed is checked before any pool exists
    match evaluate_path(&client, events.as_ref(), CONTEXT, root.as_str()).await {
        Err(report) => return Ok(vec![report]),
        Ok(evaluation) if !evaluation.crawlable => return Ok(Vec::new()),
        Ok(_) => {}
    }

    let pool = WorkerPool::new(PoolConfig::new(
        CONTEXT,
        config.min_workers,
        config.max_workers,
    ))?;

    let (dead_tx, mut dead_rx) = mpsc::channel(DEAD_LINK_BUFFER);
    let collector = tokio::spawn(async move {
        let mut reports = Vec::new();
        while let Some(report) = dead_rx.recv().await {
            reports.push(report);
        }
        reports
    });

    let visited = VisitedSet::new();
    visited.mark(root.as_str()).await;

    let pending = PendingCount::new();
    let ctx = Arc::new(CrawlContext {
        scope: CrawlScope::new(root.clone(), config),
        client,
        visited,
        pending: Arc::clone(&pending),
        dead: dead_tx,
        pool: pool.clone(),
        events: Arc::clone(events),
    });

    let scheduled = CrawlTask::seed(Arc::clone(&ctx), root.as_str()).schedule();

    // A failed submit drops the seed task, so this returns right away then
    pending.wait_for_zero().await;
    pool.shutdown().await;

    let stats = pool.stats();
    let visited_count = ctx.visited.len().await;

    // Last sender: once this goes, the collector sees the channel close
    drop(ctx);
    let reports = collector.await?;

    scheduled?;

    tracing::debug!(
        seed = %root,
        visited = visited_count,
        tasks = stats.executed,
        dead = reports.len(),
        "crawl finished"
    );
    Ok(reports)
}
