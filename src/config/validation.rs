//! Configuration validation.
//!
//! Serde handles syntax; this pass checks meaning. It returns every problem it
//! finds rather than stopping at the first one, and runs before the config is
//! accepted into the system.

use std::fmt;
use std::net::SocketAddr;

use axum::http::{HeaderName, HeaderValue};
use url::Url;

use crate::config::schema::RouterConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, collecting all errors.
pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }
    if !config.listener.original_path_header.is_empty()
        && HeaderName::from_bytes(config.listener.original_path_header.as_bytes()).is_err()
    {
        errors.push(ValidationError::new(
            "listener.original_path_header",
            "not a valid header name",
        ));
    }

    match Url::parse(&config.directory.base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ValidationError::new(
            "directory.base_url",
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new(
            "directory.base_url",
            format!("must be an absolute URL ({})", e),
        )),
    }
    if config.directory.api_key.is_empty() {
        errors.push(ValidationError::new("directory.api_key", "must be set"));
    } else if HeaderValue::from_str(&config.directory.api_key).is_err() {
        errors.push(ValidationError::new(
            "directory.api_key",
            "contains characters not allowed in a header",
        ));
    }
    if config.directory.collection.trim_matches('/').is_empty() {
        errors.push(ValidationError::new("directory.collection", "must be set"));
    }
    if config.directory.origin_field.is_empty() {
        errors.push(ValidationError::new("directory.origin_field", "must be set"));
    }

    if config.upstream.relay_mode.is_none() {
        errors.push(ValidationError::new(
            "upstream.relay_mode",
            "must be set to 'strict' or 'lenient'",
        ));
    }
    if HeaderName::from_bytes(config.upstream.bypass_header.as_bytes()).is_err() {
        errors.push(ValidationError::new(
            "upstream.bypass_header",
            "not a valid header name",
        ));
    }
    if let Some(secret) = &config.upstream.bypass_secret {
        if HeaderValue::from_str(secret).is_err() {
            errors.push(ValidationError::new(
                "upstream.bypass_secret",
                "contains characters not allowed in a header",
            ));
        }
    }
    if let Some(token) = &config.upstream.automation_token {
        if HeaderValue::from_str(&format!("Bearer {}", token)).is_err() {
            errors.push(ValidationError::new(
                "upstream.automation_token",
                "contains characters not allowed in a header",
            ));
        }
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be > 0"));
    }
    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::new("timeouts.connect_secs", "must be > 0"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!(
                "'{}' is not a socket address",
                config.observability.metrics_address
            ),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::RelayMode;

    fn valid() -> RouterConfig {
        let mut config = RouterConfig::default();
        config.directory.base_url = "https://dir.example".into();
        config.directory.api_key = "anon".into();
        config.upstream.relay_mode = Some(RelayMode::Strict);
        config
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate_config(&valid()).is_ok());
    }

    #[test]
    fn test_default_config_reports_every_missing_field() {
        let errors = validate_config(&RouterConfig::default()).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert!(fields.contains(&"directory.base_url"));
        assert!(fields.contains(&"directory.api_key"));
        assert!(fields.contains(&"upstream.relay_mode"));
    }

    #[test]
    fn test_rejects_relative_directory_url() {
        let mut config = valid();
        config.directory.base_url = "/rest/v1".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "directory.base_url");
    }

    #[test]
    fn test_rejects_bad_credentials_and_timeouts() {
        let mut config = valid();
        config.upstream.bypass_secret = Some("line\nbreak".into());
        config.upstream.bypass_header = "bad header".into();
        config.timeouts.request_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_metrics_address_checked_only_when_enabled() {
        let mut config = valid();
        config.observability.metrics_address = "nowhere".into();
        assert!(validate_config(&config).is_ok());
        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());
    }
}
