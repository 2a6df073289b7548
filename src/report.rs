// src/report.rs
// =============================================================================
// The dead link record.
//
// A LinkReport is created exactly once for every URL that fails: the probe
// got no response, the server answered with a non-2xx status, or the page
// could not be fetched for farming. Reports travel over the dead-link channel
// to the coordinator and end up, in arrival order, in the list `run` returns.
// =============================================================================

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Status recorded when no HTTP status exists (transport and farming failures)
pub const SYNTHETIC_SERVER_ERROR: u16 = 500;

/// Why a request never produced a response
///
/// Same buckets the link checker has always used: it's much more useful to
/// tell the user "DNS failed" than to dump a raw reqwest error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    Timeout,
    TooManyRedirects,
    Dns,
    Connect,
    Tls,
    Other,
}

/// The cause attached to a LinkReport
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    #[error("request failed ({kind:?}): {message}")]
    Transport { kind: TransportKind, message: String },

    #[error("link failed with HTTP {0}")]
    Status(u16),

    #[error("failed to farm links: {0}")]
    Farm(String),
}

// Reports are serialized for --json output; the error is written as its
// display string.
impl Serialize for LinkError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkReport {
    /// The absolute URL that failed
    pub link: String,
    /// Observed HTTP status, or 500 when there was none
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<LinkError>,
}

impl LinkReport {
    pub fn new(link: impl Into<String>, status: u16, error: LinkError) -> Self {
        Self {
            link: link.into(),
            status,
            error: Some(error),
        }
    }

    /// True when the server never answered
    pub fn is_transport_failure(&self) -> bool {
        matches!(self.error, Some(LinkError::Transport { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_json_shape() {
        let report = LinkReport::new(
            "http://example.com/missing",
            404,
            LinkError::Status(404),
        );
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["link"], "http://example.com/missing");
        assert_eq!(json["status"], 404);
        assert_eq!(json["error"], "link failed with HTTP 404");
    }

    #[test]
    fn test_transport_failure() {
        let report = LinkReport::new(
            "http://127.0.0.1:1/",
            SYNTHETIC_SERVER_ERROR,
            LinkError::Transport {
                kind: TransportKind::Connect,
                message: "connection refused".to_string(),
            },
        );
        assert!(report.is_transport_failure());
        assert_eq!(report.status, 500);
    }
}
