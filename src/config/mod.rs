//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, overlay environment)
//!     → validation.rs (semantic checks)
//!     → RouterConfig (validated, immutable)
//!     → handed to RouterServer::new once at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; request handling never reads the environment
//! - All fields have defaults to allow minimal configs, except the relay mode
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    DirectoryConfig, HeaderPolicyKind, ListenerConfig, LogFormat, ObservabilityConfig,
    RelayMode, RouterConfig, TimeoutConfig, UpstreamConfig,
};
