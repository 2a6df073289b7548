// src/checker/mod.rs
// =============================================================================
// Everything that touches the network.
//
// Submodules:
// - http:  the HttpClient (HEAD + GET) and transport error categories
// - probe: the path evaluator, "is this URL dead, a leaf, or crawlable?"
// - html:  the link farmer, "which href/src values does this page have?"
// =============================================================================

mod html;
mod http;
mod probe;

pub use html::{extract_links, farm_links, FarmError, LinkStream};
pub use http::{categorize_error, transport_error, HeadResponse, HttpClient};
pub use probe::{evaluate_path, Evaluation};
