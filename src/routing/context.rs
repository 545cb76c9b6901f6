//! Request context extraction.
//!
//! # Responsibilities
//! - Pick the effective path (original-path header first, URI path otherwise)
//! - Split it into segments; the first one is the slug
//! - Rebuild the sub-path that is forwarded upstream
//!
//! # Design Decisions
//! - Derived once per request and never mutated afterwards
//! - Empty segments are discarded, so `//a//b/` is `["a", "b"]`
//! - The query string always comes from the inbound URI

use axum::http::{HeaderMap, HeaderName, Method, Uri};
use url::Url;

/// Placeholder origin used to resolve the original-path header, which may be
/// a bare path or an absolute URL.
const PLACEHOLDER_ORIGIN: &str = "http://router.invalid/";

/// Favicon probes short-circuit to 204 before resolution.
const FAVICON_SLUGS: [&str; 2] = ["favicon.ico", "favicon.png"];

/// Routing-relevant view of an inbound request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    pub path_segments: Vec<String>,
    pub remaining_path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
}

impl RequestContext {
    /// Build the context from request parts.
    ///
    /// `original_path_header`, when set and present with a non-empty value,
    /// takes precedence over the URI path.
    pub fn from_parts(
        method: &Method,
        uri: &Uri,
        headers: &HeaderMap,
        original_path_header: Option<&HeaderName>,
    ) -> Self {
        let path = original_path_header
            .and_then(|name| headers.get(name))
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .and_then(path_of_original)
            .unwrap_or_else(|| uri.path().to_string());

        let path_segments: Vec<String> = path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect();

        let remaining_path = format!(
            "/{}",
            path_segments.iter().skip(1).cloned().collect::<Vec<_>>().join("/")
        );

        Self {
            method: method.clone(),
            path_segments,
            remaining_path,
            query: uri.query().map(str::to_string),
            headers: headers.clone(),
        }
    }

    /// The routing key, if the path has at least one segment.
    pub fn slug(&self) -> Option<&str> {
        self.path_segments.first().map(String::as_str)
    }

    pub fn is_favicon_probe(&self) -> bool {
        self.slug().is_some_and(|slug| FAVICON_SLUGS.contains(&slug))
    }

    /// Sub-path plus query, as a reference to resolve against an origin.
    pub fn upstream_reference(&self) -> String {
        match &self.query {
            Some(query) => format!("{}?{}", self.remaining_path, query),
            None => self.remaining_path.clone(),
        }
    }
}

fn path_of_original(value: &str) -> Option<String> {
    let base = Url::parse(PLACEHOLDER_ORIGIN).ok()?;
    base.join(value).ok().map(|url| url.path().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn context(uri: &str, rewritten: Option<&str>) -> RequestContext {
        let uri: Uri = uri.parse().unwrap();
        let mut headers = HeaderMap::new();
        if let Some(v) = rewritten {
            headers.insert("x-vercel-rewritten-url", HeaderValue::from_str(v).unwrap());
        }
        let name = HeaderName::from_static("x-vercel-rewritten-url");
        RequestContext::from_parts(&Method::GET, &uri, &headers, Some(&name))
    }

    #[test]
    fn test_slug_and_sub_path() {
        let ctx = context("/my-app/data/items?x=1", None);
        assert_eq!(ctx.slug(), Some("my-app"));
        assert_eq!(ctx.remaining_path, "/data/items");
        assert_eq!(ctx.query.as_deref(), Some("x=1"));
        assert_eq!(ctx.upstream_reference(), "/data/items?x=1");
    }

    #[test]
    fn test_sub_path_defaults_to_root() {
        let ctx = context("/my-app", None);
        assert_eq!(ctx.remaining_path, "/");
        assert_eq!(ctx.upstream_reference(), "/");
    }

    #[test]
    fn test_empty_segments_are_discarded() {
        let ctx = context("//my-app//a///b/", None);
        assert_eq!(ctx.path_segments, vec!["my-app", "a", "b"]);
        assert_eq!(ctx.remaining_path, "/a/b");
    }

    #[test]
    fn test_root_has_no_slug() {
        assert_eq!(context("/", None).slug(), None);
        assert_eq!(context("///", None).slug(), None);
    }

    #[test]
    fn test_original_path_header_wins() {
        let ctx = context("/api/router?x=1", Some("/my-app/page"));
        assert_eq!(ctx.slug(), Some("my-app"));
        assert_eq!(ctx.remaining_path, "/page");
        assert_eq!(ctx.query.as_deref(), Some("x=1"));
    }

    #[test]
    fn test_original_path_header_may_be_absolute_url() {
        let ctx = context("/api/router", Some("https://edge.example/other/deep/path?ignored=1"));
        assert_eq!(ctx.slug(), Some("other"));
        assert_eq!(ctx.remaining_path, "/deep/path");
        assert_eq!(ctx.query, None);
    }

    #[test]
    fn test_empty_original_path_header_falls_back_to_uri() {
        let ctx = context("/my-app/page?x=1", Some(""));
        assert_eq!(ctx.slug(), Some("my-app"));
        assert_eq!(ctx.remaining_path, "/page");
    }

    #[test]
    fn test_header_ignored_when_not_configured() {
        let uri: Uri = "/real/path".parse().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert("x-vercel-rewritten-url", HeaderValue::from_static("/spoofed"));
        let ctx = RequestContext::from_parts(&Method::GET, &uri, &headers, None);
        assert_eq!(ctx.slug(), Some("real"));
    }

    #[test]
    fn test_favicon_probe() {
        assert!(context("/favicon.ico", None).is_favicon_probe());
        assert!(context("/favicon.png", None).is_favicon_probe());
        assert!(!context("/my-app/favicon.ico", None).is_favicon_probe());
    }
}
