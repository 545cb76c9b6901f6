//! Slug-based dynamic reverse-proxy router.
//!
//! `/<slug>/<sub-path>?<query>` is resolved to an origin through a directory
//! service, fetched with bounded manual redirect following, and relayed back
//! with hop-by-hop headers stripped.

// Core pipeline
pub mod directory;
pub mod error;
pub mod http;
pub mod routing;
pub mod security;
pub mod upstream;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use config::RouterConfig;
pub use error::{RouterError, RouterResult};
pub use http::RouterServer;
pub use lifecycle::Shutdown;
