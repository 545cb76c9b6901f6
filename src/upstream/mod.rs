//! Upstream fetch subsystem.
//!
//! # Data Flow
//! ```text
//! RouteMapping + RequestContext
//!     → target_url (sub-path and query resolved against the origin)
//!     → redirect.rs (Attempting → fetch → Attempting | Done)
//!     → FollowOutcome handed to the response relay
//! ```

pub mod redirect;

use url::Url;

use crate::directory::RouteMapping;
use crate::error::{RouterError, RouterResult};
use crate::routing::RequestContext;

pub use redirect::{
    FollowOutcome, ProxyAttempt, RedirectFollower, StopReason, UpstreamRequest, MAX_REDIRECTS,
};

/// Initial upstream URL: `<remainingPath>?<query>` resolved against the origin.
///
/// The reference is absolute-path, so it replaces any path on the origin.
pub fn target_url(mapping: &RouteMapping, ctx: &RequestContext) -> RouterResult<Url> {
    let origin = Url::parse(&mapping.origin_base_url).map_err(|e| {
        RouterError::Internal(format!(
            "origin '{}' for slug '{}' is not an absolute URL: {}",
            mapping.origin_base_url, mapping.slug, e
        ))
    })?;
    origin
        .join(&ctx.upstream_reference())
        .map_err(RouterError::internal)
}
