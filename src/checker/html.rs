// src/checker/html.rs
// =============================================================================
// The link farmer: pulls every href and src value out of an HTML page.
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (Document Object Model)
// - Supports CSS selectors for finding elements
// - Is built on html5ever (Mozilla's HTML parser)
//
// Unlike a simple link extractor we do NOT resolve or filter links here.
// The raw attribute values go out exactly as written in the page; deciding
// what they mean (relative? external? a #fragment?) is crawl::scope's job.
//
// Links are handed over through a channel by a background producer, so the
// crawl task can start scheduling children while the rest are still coming.
// =============================================================================

use futures::Stream;
use scraper::{Html, Selector};
use std::pin::Pin;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::mpsc;

use super::http::HttpClient;

/// Placeholder href that does nothing; never worth checking
const VOID_LINK: &str = "javascript:void(0)";

const LINK_BUFFER: usize = 32;

#[derive(Debug, Error)]
pub enum FarmError {
    #[error("failed to fetch page: {0}")]
    Fetch(#[source] reqwest::Error),

    #[error("page returned HTTP {0}")]
    Status(u16),

    #[error("failed to read page body: {0}")]
    Body(#[source] reqwest::Error),

    #[error("invalid selector '{0}'")]
    Selector(String),
}

/// The raw links of one page, in page order
///
/// Single use: once drained it is done. Dropping it early stops the producer.
pub struct LinkStream {
    rx: mpsc::Receiver<String>,
}

impl LinkStream {
    /// Starts a producer that sends `links` one by one
    fn spawn(links: Vec<String>) -> Self {
        let (tx, rx) = mpsc::channel(LINK_BUFFER);
        tokio::spawn(async move {
            for link in links {
                // The consumer went away; nothing left to do
                if tx.send(link).await.is_err() {
                    break;
                }
            }
        });
        Self { rx }
    }
}

impl Stream for LinkStream {
    type Item = String;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<String>> {
        self.rx.poll_recv(cx)
    }
}

/// Fetches `url` and streams out its href/src values
///
/// A fetch failure is returned before any link is produced.
pub async fn farm_links(client: &HttpClient, url: &str) -> Result<LinkStream, FarmError> {
    let body = client.fetch_document(url).await?;

    // Html isn't Send, so parsing stays in this synchronous call and only
    // plain Strings cross into the producer task.
    let links = extract_links(&body)?;

    tracing::trace!(url, links = links.len(), "farmed page");
    Ok(LinkStream::spawn(links))
}

/// Extracts raw href and src values from an HTML document
///
/// The two kinds are interleaved: 1st href, 1st src, 2nd href, 2nd src...
/// until both lists run out. Values containing `javascript:void(0)` are
/// skipped.
pub fn extract_links(html: &str) -> Result<Vec<String>, FarmError> {
    let document = Html::parse_document(html);

    let hrefs = attribute_values(&document, "href")?;
    let srcs = attribute_values(&document, "src")?;

    let total = hrefs.len().max(srcs.len());
    let mut links = Vec::with_capacity(hrefs.len() + srcs.len());

    for i in 0..total {
        for values in [&hrefs, &srcs] {
            if let Some(value) = values.get(i) {
                if !value.contains(VOID_LINK) {
                    links.push(value.clone());
                }
            }
        }
    }

    Ok(links)
}

/// Every value of `attr` on elements that carry it, in document order
fn attribute_values(document: &Html, attr: &str) -> Result<Vec<String>, FarmError> {
    let css = format!("[{}]", attr);
    let selector = Selector::parse(&css).map_err(|_| FarmError::Selector(css.clone()))?;

    Ok(document
        .select(&selector)
        .filter_map(|element| element.value().attr(attr))
        .map(str::to_string)
        .collect())
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why "[href]" instead of "a[href]"?
//    - Dead stylesheets (<link href>) are just as broken as dead anchors
//    - Same for "[src]": <script>, <img>, <iframe>, <source>...
//
// 2. Why a channel instead of returning the Vec?
//    - The consumer is an async task; a Stream lets it process links as they
//      arrive with `while let Some(link) = links.next().await`
//    - The bounded buffer keeps the producer from racing far ahead
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_interleaves_href_and_src() {
        let html = r#"
            <link rel="stylesheet" href="/style.css">
            <a href="/one">One</a>
            <a href="/two">Two</a>
            <script src="/app.js"></script>
        "#;
        let links = extract_links(html).unwrap();
        assert_eq!(links, vec!["/style.css", "/app.js", "/one", "/two"]);
    }

    #[test]
    fn test_more_srcs_than_hrefs() {
        let html = r#"
            <a href="/page">Page</a>
            <img src="/a.png"><img src="/b.png"><img src="/c.png">
        "#;
        let links = extract_links(html).unwrap();
        assert_eq!(links, vec!["/page", "/a.png", "/b.png", "/c.png"]);
    }

    #[test]
    fn test_skips_void_placeholder() {
        let html = r#"
            <a href="javascript:void(0)">Menu</a>
            <a href="/real">Real</a>
        "#;
        let links = extract_links(html).unwrap();
        assert_eq!(links, vec!["/real"]);
    }

    #[test]
    fn test_keeps_raw_values() {
        // No resolving, no filtering of fragments or other hosts
        let html = r##"
            <a href="#top">Top</a>
            <a href="http://other.example/x">Other</a>
            <a href="../up">Up</a>
        "##;
        let links = extract_links(html).unwrap();
        assert_eq!(links, vec!["#top", "http://other.example/x", "../up"]);
    }

    #[test]
    fn test_empty_document() {
        assert!(extract_links("<html><body></body></html>").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_farm_links_streams_page_links() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"<a href="/a"></a><img src="/b.png"><a href="/c"></a>"#,
                "text/html",
            ))
            .mount(&server)
            .await;

        let client = HttpClient::new(Duration::from_secs(5)).unwrap();
        let stream = farm_links(&client, &format!("{}/", server.uri())).await.unwrap();
        let links: Vec<String> = stream.collect().await;

        assert_eq!(links, vec!["/a", "/b.png", "/c"]);
    }

    #[tokio::test]
    async fn test_farm_links_fails_before_streaming() {
        let server = MockServer::start().await;
        let client = HttpClient::new(Duration::from_secs(5)).unwrap();

        let result = farm_links(&client, &format!("{}/nothing", server.uri())).await;
        assert!(matches!(result, Err(FarmError::Status(404))));
    }
}
