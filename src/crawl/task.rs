// src/crawl/task.rs
// =============================================================================
// A crawl task: the unit of work the pool runs, one per URL.
//
//   Created -> Evaluating -> Farming -> Dispatching children -> Done
//
// - Evaluating: HEAD the URL (skipped for the seed, the coordinator already
//   did it). Dead -> report it. Alive but not HTML -> stop, it's a leaf.
// - Depth gate: past max_depth we stop here, without farming.
// - Farming: GET the page and stream its raw href/src values.
// - Dispatching: classify each link; every new in-scope URL becomes a child
//   task one level deeper.
// - Done: the task's PendingGuard is dropped, whatever path got us here.
// =============================================================================

use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc;
use url::Url;

use super::pending::{PendingCount, PendingGuard};
use super::scope::{classify, LinkDecision};
use super::visited::VisitedSet;
use crate::checker::{evaluate_path, farm_links, HttpClient};
use crate::config::CrawlScope;
use crate::events::EventSink;
use crate::pool::{PoolError, WorkerPool};
use crate::report::{LinkError, LinkReport, SYNTHETIC_SERVER_ERROR};

/// State shared by every task of one crawl
pub struct CrawlContext {
    pub scope: CrawlScope,
    pub client: HttpClient,
    pub visited: VisitedSet,
    pub pending: Arc<PendingCount>,
    pub dead: mpsc::Sender<LinkReport>,
    pub pool: WorkerPool,
    pub events: Arc<dyn EventSink>,
}

pub struct CrawlTask {
    url: String,
    depth: usize,
    skip_check: bool,
    ctx: Arc<CrawlContext>,
    // Dropped last, once the task is completely done
    _pending: PendingGuard,
}

impl CrawlTask {
    /// The first task of a crawl. Its URL has already been evaluated.
    pub fn seed(ctx: Arc<CrawlContext>, url: impl Into<String>) -> Self {
        let pending = ctx.pending.acquire();
        Self {
            url: url.into(),
            depth: 0,
            skip_check: true,
            ctx,
            _pending: pending,
        }
    }

    fn child(&self, url: Url) -> Self {
        Self {
            url: url.into(),
            depth: self.depth + 1,
            skip_check: false,
            ctx: Arc::clone(&self.ctx),
            _pending: self.ctx.pending.acquire(),
        }
    }

    /// Hands the task to the pool. If that fails the task is dropped, which
    /// also releases its pending count.
    pub fn schedule(self) -> Result<(), PoolError> {
        let pool = self.ctx.pool.clone();
        pool.submit(move |worker| self.work(worker))
    }

    async fn work(self, worker: usize) {
        let context = format!("worker-{}", worker);
        let ctx = Arc::clone(&self.ctx);

        if !self.skip_check {
            match evaluate_path(&ctx.client, ctx.events.as_ref(), &context, &self.url).await {
                Err(report) => {
                    self.report(report).await;
                    return;
                }
                // Exists, but nothing to farm
                Ok(evaluation) if !evaluation.crawlable => return,
                Ok(_) => {}
            }
        }

        if !ctx.scope.may_expand(self.depth) {
            tracing::debug!(url = %self.url, depth = self.depth, "max depth reached, not farming");
            return;
        }

        let mut links = match farm_links(&ctx.client, &self.url).await {
            Ok(links) => links,
            Err(e) => {
                ctx.events.error_event(
                    &context,
                    "farm_links",
                    &e,
                    format_args!("Failed to Farm Links for Page[{}]", self.url),
                );
                let error = LinkError::Farm(e.to_string());
                self.report(LinkReport::new(&self.url, SYNTHETIC_SERVER_ERROR, error))
                    .await;
                return;
            }
        };

        // Relative links are resolved against the page they were found on
        let page = Url::parse(&self.url).unwrap_or_else(|_| ctx.scope.root.clone());

        while let Some(raw) = links.next().await {
            self.dispatch(&raw, &page).await;
        }
    }

    async fn dispatch(&self, raw: &str, page: &Url) {
        let visited = &self.ctx.visited;

        match classify(raw, page, &self.ctx.scope) {
            LinkDecision::Fragment => visited.mark(raw).await,
            LinkDecision::SelfLink | LinkDecision::Unparsable => {
                tracing::trace!(link = raw, "skipping link");
            }
            LinkDecision::UnsupportedScheme(url) | LinkDecision::OutOfScope(url) => {
                tracing::trace!(link = %url, "link out of scope");
                visited.mark(url.as_str()).await;
            }
            LinkDecision::Follow(url) => {
                if !visited.try_mark_visited(url.as_str()).await {
                    return;
                }

                let child = self.child(url);
                tracing::debug!(url = %child.url, depth = child.depth, "scheduling");
                if let Err(e) = child.schedule() {
                    tracing::warn!(link = raw, error = %e, "could not schedule link");
                }
            }
        }
    }

    async fn report(&self, report: LinkReport) {
        if self.ctx.dead.send(report).await.is_err() {
            tracing::warn!(url = %self.url, "dead link collector is gone, report dropped");
        }
    }
}
