//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::RouterConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {var}: {message}")]
    Env { var: &'static str, message: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from an optional TOML file plus the process environment,
/// then validate it.
pub fn load_config(path: Option<&Path>) -> Result<RouterConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => RouterConfig::default(),
    };

    apply_env_overrides(&mut config, |var| std::env::var(var).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay environment variables onto `config`.
///
/// `lookup` resolves a variable name to its value. Empty values are treated as
/// unset, so an exported-but-blank credential does not override the file.
pub fn apply_env_overrides<F>(config: &mut RouterConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |var: &str| lookup(var).filter(|v| !v.is_empty());

    if let Some(v) = get("SUPABASE_URL") {
        config.directory.base_url = v;
    }
    if let Some(v) = get("SUPABASE_ANON_KEY") {
        config.directory.api_key = v;
    }
    if let Some(v) = get("VERCEL_PROTECTION_BYPASS_SECRET") {
        config.upstream.bypass_secret = Some(v);
    }
    if let Some(v) = get("VERCEL_AUTOMATION_TOKEN") {
        config.upstream.automation_token = Some(v);
    }
    if let Some(v) = get("ROUTER_BIND_ADDRESS") {
        config.listener.bind_address = v;
    }
    if let Some(v) = get("ROUTER_HEADER_POLICY") {
        config.upstream.header_policy = v.parse().map_err(|message| ConfigError::Env {
            var: "ROUTER_HEADER_POLICY",
            message,
        })?;
    }
    if let Some(v) = get("ROUTER_RELAY_MODE") {
        config.upstream.relay_mode = Some(v.parse().map_err(|message| ConfigError::Env {
            var: "ROUTER_RELAY_MODE",
            message,
        })?);
    }
    if let Some(v) = get("ROUTER_LOG_LEVEL") {
        config.observability.log_level = v;
    }
    if let Some(v) = get("ROUTER_LOG_FORMAT") {
        config.observability.log_format = v.parse().map_err(|message| ConfigError::Env {
            var: "ROUTER_LOG_FORMAT",
            message,
        })?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{HeaderPolicyKind, RelayMode};
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_env_populates_directory_and_credentials() {
        let mut config = RouterConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[
                ("SUPABASE_URL", "https://dir.example"),
                ("SUPABASE_ANON_KEY", "anon"),
                ("VERCEL_PROTECTION_BYPASS_SECRET", "bypass"),
                ("VERCEL_AUTOMATION_TOKEN", "token"),
                ("ROUTER_HEADER_POLICY", "passthrough"),
                ("ROUTER_RELAY_MODE", "strict"),
            ]),
        )
        .unwrap();

        assert_eq!(config.directory.base_url, "https://dir.example");
        assert_eq!(config.directory.api_key, "anon");
        assert_eq!(config.upstream.bypass_secret.as_deref(), Some("bypass"));
        assert_eq!(config.upstream.automation_token.as_deref(), Some("token"));
        assert_eq!(config.upstream.header_policy, HeaderPolicyKind::Passthrough);
        assert_eq!(config.upstream.relay_mode, Some(RelayMode::Strict));
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_empty_env_values_are_ignored() {
        let mut config = RouterConfig::default();
        config.upstream.automation_token = Some("from-file".into());
        apply_env_overrides(
            &mut config,
            env(&[("VERCEL_AUTOMATION_TOKEN", ""), ("VERCEL_PROTECTION_BYPASS_SECRET", "")]),
        )
        .unwrap();

        assert_eq!(config.upstream.automation_token.as_deref(), Some("from-file"));
        assert!(config.upstream.bypass_secret.is_none());
    }

    #[test]
    fn test_unknown_relay_mode_is_rejected() {
        let mut config = RouterConfig::default();
        let err = apply_env_overrides(&mut config, env(&[("ROUTER_RELAY_MODE", "maybe")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Env { var: "ROUTER_RELAY_MODE", .. }));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_config(Some(Path::new("/nonexistent/slug-router.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
