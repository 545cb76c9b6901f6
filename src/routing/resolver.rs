//! Slug resolution.
//!
//! Turns a [`RequestContext`] into a [`RouteMapping`] by asking the directory.
//! Immutable after construction, so one instance is shared by every request.

use crate::directory::{DirectoryClient, RouteMapping};
use crate::error::{RouterError, RouterResult};
use crate::observability::metrics;
use crate::routing::context::RequestContext;

#[derive(Debug, Clone)]
pub struct SlugResolver {
    directory: DirectoryClient,
}

impl SlugResolver {
    pub fn new(directory: DirectoryClient) -> Self {
        Self { directory }
    }

    /// Resolve the request's slug to an origin.
    pub async fn resolve(&self, ctx: &RequestContext) -> RouterResult<RouteMapping> {
        let slug = ctx.slug().ok_or(RouterError::MissingSlug)?;
        tracing::info!(slug = %slug, "Received request for slug");

        let result = self.directory.lookup(slug).await;
        metrics::record_resolution(result.is_ok());
        result
    }
}
