//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the router.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the slug router.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RouterConfig {
    /// Listener configuration (bind address, original-path header).
    pub listener: ListenerConfig,

    /// Directory service used to resolve slugs.
    pub directory: DirectoryConfig,

    /// Upstream fetch, header policy and relay settings.
    pub upstream: UpstreamConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Header carrying the path as seen before any platform rewrite.
    /// Empty string disables the lookup.
    pub original_path_header: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            original_path_header: "x-vercel-rewritten-url".to_string(),
        }
    }
}

/// Directory service (slug → origin) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DirectoryConfig {
    /// Base URL of the directory service (e.g., "https://xyz.supabase.co").
    pub base_url: String,

    /// API key, sent both as `apikey` and as a bearer token.
    pub api_key: String,

    /// Path between the base URL and the collection.
    pub rest_prefix: String,

    /// Collection (table) holding the route mappings.
    pub collection: String,

    /// Field holding the origin base URL.
    pub origin_field: String,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            rest_prefix: "rest/v1".to_string(),
            collection: "projects".to_string(),
            origin_field: "preview_url".to_string(),
        }
    }
}

/// Which outbound header strategy to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HeaderPolicyKind {
    /// Forward only a fixed set of content-negotiation headers.
    #[default]
    AllowList,
    /// Forward everything except `host`.
    Passthrough,
}

impl std::str::FromStr for HeaderPolicyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "allow_list" | "allow-list" | "allowlist" => Ok(Self::AllowList),
            "passthrough" => Ok(Self::Passthrough),
            other => Err(format!("unknown header policy '{}'", other)),
        }
    }
}

/// How non-200 terminal upstream statuses reach the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelayMode {
    /// Only 200 is relayed; anything else becomes a 502 with diagnostics.
    Strict,
    /// Every terminal status is relayed as received.
    Lenient,
}

impl std::str::FromStr for RelayMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "lenient" => Ok(Self::Lenient),
            other => Err(format!("unknown relay mode '{}'", other)),
        }
    }
}

/// Upstream (backend) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Outbound header strategy.
    pub header_policy: HeaderPolicyKind,

    /// Relay strictness. Deliberately has no default; must be set.
    pub relay_mode: Option<RelayMode>,

    /// Header name used for the protection bypass secret.
    pub bypass_header: String,

    /// Protection bypass secret (takes precedence over the token).
    pub bypass_secret: Option<String>,

    /// Automation token, sent as `Authorization: Bearer <token>`.
    pub automation_token: Option<String>,

    /// Largest inbound body buffered for forwarding.
    pub max_body_bytes: usize,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            header_policy: HeaderPolicyKind::default(),
            relay_mode: None,
            bypass_header: "x-vercel-protection-bypass".to_string(),
            bypass_secret: None,
            automation_token: None,
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::default(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let config: RouterConfig = toml::from_str(
            r#"
            [directory]
            base_url = "https://dir.example"
            api_key = "anon"

            [upstream]
            relay_mode = "lenient"
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.directory.collection, "projects");
        assert_eq!(config.directory.origin_field, "preview_url");
        assert_eq!(config.upstream.header_policy, HeaderPolicyKind::AllowList);
        assert_eq!(config.upstream.relay_mode, Some(RelayMode::Lenient));
        assert!(config.upstream.bypass_secret.is_none());
    }

    #[test]
    fn test_relay_mode_has_no_default() {
        assert!(RouterConfig::default().upstream.relay_mode.is_none());
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("passthrough".parse::<HeaderPolicyKind>(), Ok(HeaderPolicyKind::Passthrough));
        assert_eq!("Allow-List".parse::<HeaderPolicyKind>(), Ok(HeaderPolicyKind::AllowList));
        assert!("open".parse::<HeaderPolicyKind>().is_err());
        assert_eq!("STRICT".parse::<RelayMode>(), Ok(RelayMode::Strict));
    }
}
