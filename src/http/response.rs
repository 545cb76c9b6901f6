//! Response relay.
//!
//! # Responsibilities
//! - Strip hop-by-hop and already-resolved headers from the upstream response
//! - Apply the relay mode (strict: 200 only, lenient: any terminal status)
//! - Stream the upstream body to the client without buffering
//!
//! # Design Decisions
//! - `location` and `cookie` are dropped: the redirect or cookie was already
//!   handled on the router's side
//! - `content-length` and `content-encoding` are dropped because the body is
//!   re-streamed (and already decoded by the upstream client)
//! - Only strict mode's error path reads the full upstream body

use axum::{
    body::Body,
    http::{HeaderMap, HeaderName, StatusCode},
    response::Response,
};

use crate::config::RelayMode;
use crate::error::{RouterError, RouterResult};
use crate::upstream::FollowOutcome;

/// Upstream response headers never relayed to the client.
pub const HOP_BY_HOP: [&str; 13] = [
    "host",
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "content-encoding",
    "content-length",
    "location",
    "cookie",
];

pub fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(&name.as_str())
}

/// Copy every header except the hop-by-hop set.
pub fn filter_response_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut filtered = HeaderMap::new();
    for (name, value) in upstream {
        if !is_hop_by_hop(name) {
            filtered.append(name.clone(), value.clone());
        }
    }
    filtered
}

/// Turn the terminal upstream response into the client response.
pub async fn relay(mode: RelayMode, outcome: FollowOutcome) -> RouterResult<Response> {
    let response = outcome.response;
    let status = response.status();

    if mode == RelayMode::Strict && status != StatusCode::OK {
        let body = response.text().await.map_err(|e| {
            RouterError::Internal(format!("reading upstream error body failed: {}", e))
        })?;
        tracing::error!(
            status = %status,
            url = %outcome.final_url,
            stop = ?outcome.stop,
            body = %body,
            "Agent returned a non-200 status"
        );
        return Err(RouterError::UpstreamStatus { status, body });
    }

    let headers = filter_response_headers(response.headers());
    let mut relayed = Response::new(Body::from_stream(response.bytes_stream()));
    *relayed.status_mut() = status;
    *relayed.headers_mut() = headers;
    Ok(relayed)
}
