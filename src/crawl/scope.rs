// src/crawl/scope.rs
// =============================================================================
// URL classification: what should we do with a raw link from a page?
//
// Pure functions, no I/O. The order of the checks matters:
//   1. "#fragment"               -> Fragment (remember it, skip it)
//   2. "/" or the seed's path    -> SelfLink (skip)
//   3. can't be parsed/resolved  -> Unparsable (skip)
//   4. not http/https            -> UnsupportedScheme (remember, skip)
//   5. other host, not allowed   -> OutOfScope (remember, skip)
//   6. anything else             -> Follow
//
// None of the skips are dead links. Out-of-scope is not a failure.
// =============================================================================

use url::{ParseError, Url};

use crate::config::{authority, CrawlScope};

/// What the crawl task should do with one raw link
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkDecision {
    Fragment,
    SelfLink,
    Unparsable,
    UnsupportedScheme(Url),
    OutOfScope(Url),
    Follow(Url),
}

/// Parses `raw`, resolving it against `base` when it isn't absolute
///
/// Examples with base = "https://example.com/docs/page":
///   "/about"               -> https://example.com/about
///   "intro"                -> https://example.com/docs/intro
///   "?lang=en"             -> https://example.com/docs/page?lang=en
///   "//cdn.example.com/a"  -> https://cdn.example.com/a
///   "https://other.com"    -> https://other.com/
pub fn resolve(raw: &str, base: &Url) -> Result<Url, ParseError> {
    match Url::parse(raw) {
        Ok(url) => Ok(url),
        Err(ParseError::RelativeUrlWithoutBase) => base.join(raw),
        Err(e) => Err(e),
    }
}

/// Whether `url` may be crawled under this scope's host rule
///
/// The check is a substring match on host[:port], so with a seed on
/// "example.com" a link to "docs.example.com" is still in scope.
pub fn in_scope(url: &Url, scope: &CrawlScope) -> bool {
    scope.allow_external || authority(url).contains(&scope.root_authority)
}

/// Decides what to do with `raw`, a link found on the page at `page`
pub fn classify(raw: &str, page: &Url, scope: &CrawlScope) -> LinkDecision {
    if raw.starts_with('#') {
        return LinkDecision::Fragment;
    }

    if raw.trim() == "/" || raw == scope.root_path() {
        return LinkDecision::SelfLink;
    }

    let url = match resolve(raw, page) {
        Ok(url) => url,
        Err(_) => return LinkDecision::Unparsable,
    };

    if !matches!(url.scheme(), "http" | "https") {
        return LinkDecision::UnsupportedScheme(url);
    }

    if !in_scope(&url, scope) {
        return LinkDecision::OutOfScope(url);
    }

    LinkDecision::Follow(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CrawlConfig;

    fn scope(seed: &str, allow_external: bool) -> CrawlScope {
        let config = CrawlConfig::new(seed).allow_external(allow_external);
        CrawlScope::new(Url::parse(seed).unwrap(), &config)
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_resolve_relative_forms() {
        let base = url("https://example.com/docs/page");
        assert_eq!(resolve("/about", &base).unwrap().as_str(), "https://example.com/about");
        assert_eq!(resolve("intro", &base).unwrap().as_str(), "https://example.com/docs/intro");
        assert_eq!(resolve("../up", &base).unwrap().as_str(), "https://example.com/up");
        assert_eq!(
            resolve("?lang=en", &base).unwrap().as_str(),
            "https://example.com/docs/page?lang=en"
        );
        assert_eq!(
            resolve("//cdn.example.com/a.js", &base).unwrap().as_str(),
            "https://cdn.example.com/a.js"
        );
    }

    #[test]
    fn test_resolve_absolute_ignores_base() {
        let base = url("https://example.com/docs/page");
        assert_eq!(resolve("https://other.com", &base).unwrap().as_str(), "https://other.com/");
    }

    #[test]
    fn test_resolve_garbage_fails() {
        let base = url("https://example.com/");
        assert!(resolve("http://[::1", &base).is_err());
    }

    #[test]
    fn test_fragment_only() {
        let scope = scope("http://example.com/", false);
        assert_eq!(classify("#section", &scope.root, &scope), LinkDecision::Fragment);
    }

    #[test]
    fn test_self_links() {
        let scope = scope("http://example.com/docs/", false);
        assert_eq!(classify("/", &scope.root, &scope), LinkDecision::SelfLink);
        assert_eq!(classify(" / ", &scope.root, &scope), LinkDecision::SelfLink);
        assert_eq!(classify("/docs/", &scope.root, &scope), LinkDecision::SelfLink);
    }

    #[test]
    fn test_external_host_out_of_scope() {
        let scope = scope("http://example.com/", false);
        let decision = classify("http://other-host.example/page", &scope.root, &scope);
        assert_eq!(
            decision,
            LinkDecision::OutOfScope(url("http://other-host.example/page"))
        );
    }

    #[test]
    fn test_external_host_allowed() {
        let scope = scope("http://example.com/", true);
        let decision = classify("http://other-host.example/page", &scope.root, &scope);
        assert_eq!(decision, LinkDecision::Follow(url("http://other-host.example/page")));
    }

    #[test]
    fn test_port_is_part_of_the_host() {
        let scope = scope("http://127.0.0.1:8080/", false);
        assert!(in_scope(&url("http://127.0.0.1:8080/a"), &scope));
        assert!(!in_scope(&url("http://127.0.0.1:9090/a"), &scope));
    }

    #[test]
    fn test_subdomain_counts_as_same_host() {
        let scope = scope("http://example.com/", false);
        assert!(in_scope(&url("http://docs.example.com/"), &scope));
    }

    #[test]
    fn test_mailto_is_skipped() {
        let scope = scope("http://example.com/", true);
        let decision = classify("mailto:someone@example.com", &scope.root, &scope);
        assert!(matches!(decision, LinkDecision::UnsupportedScheme(_)));
    }

    #[test]
    fn test_relative_link_resolved_against_current_page() {
        let scope = scope("http://example.com/", false);
        let page = url("http://example.com/blog/post");
        assert_eq!(
            classify("other", &page, &scope),
            LinkDecision::Follow(url("http://example.com/blog/other"))
        );
    }
}
