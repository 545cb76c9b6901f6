//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request headers
//!     → headers.rs (header policy: allow-list or passthrough)
//!     → headers.rs (inject bypass secret or automation token)
//!     → Outbound header set for the backend
//! ```

pub mod headers;

pub use headers::{
    AllowListPolicy, HeaderPolicy, OutboundHeaders, PassthroughPolicy, UpstreamCredentials,
};
