// src/lib.rs
// =============================================================================
// The library half of deadlink-spider.
//
// Everything that actually crawls lives here so it can be tested without the
// CLI. The binary (src/main.rs) only parses flags, calls `crawl::run`, and
// prints what comes back.
//
// Layout:
// - config:  CrawlConfig / CrawlScope, the knobs for one run
// - error:   typed errors returned by the library
// - events:  the EventSink capability used for observability
// - report:  LinkReport, the record for one dead link
// - checker: talking to the network (HEAD probes, fetching + farming links)
// - pool:    a generic bounded worker pool
// - crawl:   the crawl engine (visited set, scope rules, tasks, coordinator)
// =============================================================================

pub mod checker;
pub mod config;
pub mod crawl;
pub mod error;
pub mod events;
pub mod pool;
pub mod report;

pub use config::{CrawlConfig, CrawlScope};
pub use crawl::run;
pub use error::CrawlError;
pub use events::{EventSink, TracingEvents};
pub use report::{LinkError, LinkReport, TransportKind};
