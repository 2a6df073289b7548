// src/crawl/mod.rs
// =============================================================================
// The crawl engine.
//
// Pieces:
// - visited:     the shared set of URLs already claimed by some task
// - pending:     the outstanding-work counter that tells us when we're done
// - scope:       pure rules deciding what to do with each raw link
// - task:        one URL's journey: evaluate, farm, schedule children
// - coordinator: `run`, which wires it all together
//
// Every task runs on the WorkerPool (src/pool.rs); the crawl is finished
// when the pending count drops to zero.
// =============================================================================

mod coordinator;
mod pending;
mod scope;
mod task;
mod visited;

pub use coordinator::run;
pub use pending::{PendingCount, PendingGuard};
pub use scope::{classify, in_scope, resolve, LinkDecision};
pub use visited::VisitedSet;
