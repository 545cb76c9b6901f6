//! Directory service subsystem.
//!
//! # Data Flow
//! ```text
//! slug
//!     → client.rs (GET <base>/<prefix>/<collection>?select=<field>&slug=eq.<slug>)
//!     → first record's origin field
//!     → RouteMapping or SlugNotFound
//! ```
//!
//! # Design Decisions
//! - Resolved fresh per request, nothing is cached
//! - Every lookup failure collapses to "not found" for the client

pub mod client;

pub use client::DirectoryClient;

/// A resolved slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMapping {
    pub slug: String,
    pub origin_base_url: String,
}
