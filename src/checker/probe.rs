// src/checker/probe.rs
// =============================================================================
// The path evaluator: one HEAD request decides what a URL is.
//
//   no response        -> dead (status 500, transport error)
//   status not 2xx     -> dead (observed status, "link failed")
//   2xx, not HTML      -> alive, but a leaf: nothing to farm
//   2xx, HTML          -> alive and crawlable
// =============================================================================

use super::http::{transport_error, HttpClient};
use crate::events::EventSink;
use crate::report::{LinkError, LinkReport, SYNTHETIC_SERVER_ERROR};

const EVENT: &str = "evaluate_path";

/// A URL that answered with a 2xx status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    pub status: u16,
    /// Only HTML pages are worth farming for links
    pub crawlable: bool,
}

/// Probes `url` and classifies it. The Err side is already the LinkReport
/// the caller should send on the dead-link channel.
pub async fn evaluate_path(
    client: &HttpClient,
    events: &dyn EventSink,
    context: &str,
    url: &str,
) -> Result<Evaluation, LinkReport> {
    let head = match client.head(url).await {
        Ok(head) => head,
        Err(e) => {
            let error = transport_error(&e);
            events.error_event(
                context,
                EVENT,
                &error,
                format_args!("URL[{}] : Failed to get HEAD for path", url),
            );
            return Err(LinkReport::new(url, SYNTHETIC_SERVER_ERROR, error));
        }
    };

    if !(200..=299).contains(&head.status) {
        return Err(LinkReport::new(url, head.status, LinkError::Status(head.status)));
    }

    let crawlable = head
        .content_type
        .as_deref()
        .map_or(false, |ct| ct.contains("text/html"));

    if crawlable {
        events.event(
            context,
            EVENT,
            format_args!("URL[{}] : Status Code[{}]", url, head.status),
        );
    }

    Ok(Evaluation {
        status: head.status,
        crawlable,
    })
}
