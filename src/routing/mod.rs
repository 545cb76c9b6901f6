//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, uri, headers)
//!     → context.rs (effective path → slug + sub-path + query)
//!     → resolver.rs (directory lookup)
//!     → Return: RouteMapping, MissingSlug or SlugNotFound
//! ```
//!
//! # Design Decisions
//! - No route table: every slug is resolved against the directory per request
//! - Deterministic: same path always yields the same slug and sub-path
//! - Explicit not-found rather than a silent default backend

pub mod context;
pub mod resolver;

pub use context::RequestContext;
pub use resolver::SlugResolver;
