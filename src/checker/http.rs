// src/checker/http.rs
// =============================================================================
// The HTTP capability used by the crawler.
//
// Key functionality:
// - HEAD requests for cheap "does this exist and what is it?" probes
// - GET requests to download a page we want to farm links from
// - Turning reqwest's transport errors into a small set of categories
//
// One HttpClient is built per crawl and cloned into every task. reqwest's
// Client is reference counted internally, so clones share one connection pool.
// =============================================================================

use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::error::Error as _;
use std::time::Duration;

use super::html::FarmError;
use crate::report::{LinkError, TransportKind};

const USER_AGENT: &str = concat!("deadlink-spider/", env!("CARGO_PKG_VERSION"));

/// What a HEAD probe tells us about a URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadResponse {
    pub status: u16,
    pub content_type: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Builds a client whose requests all give up after `timeout`
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5)) // Follow up to 5 redirects
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }

    /// Sends a HEAD request. Any response at all, whatever its status, is Ok.
    pub async fn head(&self, url: &str) -> Result<HeadResponse, reqwest::Error> {
        let response = self.client.head(url).send().await?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Ok(HeadResponse {
            status: response.status().as_u16(),
            content_type,
        })
    }

    /// Downloads a document body. Non-2xx answers are errors here, since
    /// there is nothing useful to farm from an error page.
    pub async fn fetch_document(&self, url: &str) -> Result<String, FarmError> {
        let response = self.client.get(url).send().await.map_err(FarmError::Fetch)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FarmError::Status(status.as_u16()));
        }

        response.text().await.map_err(FarmError::Body)
    }
}

/// Sorts a reqwest error into a TransportKind and wraps it as a LinkError
pub fn transport_error(error: &reqwest::Error) -> LinkError {
    LinkError::Transport {
        kind: categorize_error(error),
        message: error_chain(error),
    }
}

// reqwest errors can happen for many reasons: timeout, DNS resolution,
// refused connections, certificate problems, redirect loops...
pub fn categorize_error(error: &reqwest::Error) -> TransportKind {
    // The interesting detail usually sits in a source error, so look at the
    // whole chain rather than the top-level message.
    let chain = error_chain(error).to_lowercase();

    if error.is_timeout() {
        TransportKind::Timeout
    } else if error.is_redirect() {
        TransportKind::TooManyRedirects
    } else if chain.contains("dns") {
        TransportKind::Dns
    } else if chain.contains("certificate") || chain.contains("tls") || chain.contains("ssl") {
        TransportKind::Tls
    } else if error.is_connect() {
        TransportKind::Connect
    } else {
        TransportKind::Other
    }
}

/// "outer: inner: innermost"
fn error_chain(error: &reqwest::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_head_reads_status_and_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(200).insert_header("content-type", "text/html; charset=utf-8"))
            .mount(&server)
            .await;

        let client = HttpClient::new(Duration::from_secs(5)).unwrap();
        let head = client.head(&format!("{}/page", server.uri())).await.unwrap();

        assert_eq!(head.status, 200);
        assert_eq!(head.content_type.as_deref(), Some("text/html; charset=utf-8"));
    }

    #[tokio::test]
    async fn test_fetch_document_rejects_error_status() {
        let server = MockServer::start().await;

        let client = HttpClient::new(Duration::from_secs(5)).unwrap();
        let result = client.fetch_document(&format!("{}/missing", server.uri())).await;

        assert!(matches!(result, Err(FarmError::Status(404))));
    }

    #[tokio::test]
    async fn test_refused_connection_is_a_transport_error() {
        let client = HttpClient::new(Duration::from_secs(5)).unwrap();
        // Port 1 is reserved and nothing listens on it
        let error = client.head("http://127.0.0.1:1/").await.unwrap_err();

        let link_error = transport_error(&error);
        assert!(matches!(
            link_error,
            LinkError::Transport { kind: TransportKind::Connect, .. }
        ));
    }
}
