//! Request-level error taxonomy.
//!
//! Every failure inside the routing pipeline is one of these variants. The
//! handler never lets an error escape: `IntoResponse` turns each variant into
//! the status code and plain-text body the client sees.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Errors produced while routing a single request.
#[derive(Debug, Error)]
pub enum RouterError {
    /// The first path segment is missing or empty.
    #[error("Agent slug not specified.")]
    MissingSlug,

    /// The directory has no usable record for the slug, or the lookup failed.
    #[error("Agent with slug \"{slug}\" not found.")]
    SlugNotFound { slug: String },

    /// Strict relay mode: the upstream ended on a status other than 200.
    #[error("upstream returned status {status}")]
    UpstreamStatus { status: StatusCode, body: String },

    /// Anything else. The detail is logged, never sent to the client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RouterError {
    pub fn internal(err: impl std::fmt::Display) -> Self {
        Self::Internal(err.to_string())
    }

    /// Status code the client receives for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            RouterError::MissingSlug => StatusCode::BAD_REQUEST,
            RouterError::SlugNotFound { .. } => StatusCode::NOT_FOUND,
            RouterError::UpstreamStatus { .. } => StatusCode::BAD_GATEWAY,
            RouterError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RouterError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            RouterError::MissingSlug | RouterError::SlugNotFound { .. } => self.to_string(),
            RouterError::UpstreamStatus { status: upstream, body } => format!(
                "The agent application returned an error.\n\nStatus: {}\nBody:\n{}",
                upstream.as_u16(),
                body
            ),
            RouterError::Internal(detail) => {
                tracing::error!(error = %detail, "Router error");
                "An internal error occurred.".to_string()
            }
        };

        (status, [(header::CONTENT_TYPE, "text/plain")], body).into_response()
    }
}

/// Result alias for the routing pipeline.
pub type RouterResult<T> = Result<T, RouterError>;
