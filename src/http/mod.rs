//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, routing handler)
//!     → request.rs (request ID set and propagated)
//!     → [routing resolves slug, security builds headers, upstream follows]
//!     → response.rs (relay mode, hop-by-hop stripping, streaming)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use response::{filter_response_headers, HOP_BY_HOP};
pub use server::{AppState, RouterServer};
