//! Outbound header policy.
//!
//! # Responsibilities
//! - Decide which client headers reach the backend
//! - Inject the router's own upstream credentials
//!
//! # Design Decisions
//! - Strategy trait with two implementations, picked from config
//! - Allow-list is the default: client cookies and authorization never leak
//!   into the backend's authentication
//! - Bypass secret wins over the automation token; at most one is injected

use std::fmt::Debug;

use axum::http::{header, HeaderMap, HeaderName, HeaderValue};

use crate::config::{HeaderPolicyKind, UpstreamConfig};
use crate::error::{RouterError, RouterResult};

/// Headers forwarded by [`AllowListPolicy`].
pub const ALLOWED_HEADERS: [HeaderName; 5] = [
    header::ACCEPT,
    header::ACCEPT_ENCODING,
    header::ACCEPT_LANGUAGE,
    header::USER_AGENT,
    header::REFERER,
];

/// Filters inbound request headers into the outbound set.
pub trait HeaderPolicy: Send + Sync + Debug {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Build the outbound header set from the inbound one.
    fn filter(&self, inbound: &HeaderMap) -> HeaderMap;
}

/// Copies only a fixed set of content-negotiation headers.
#[derive(Debug, Clone)]
pub struct AllowListPolicy {
    allowed: Vec<HeaderName>,
}

impl Default for AllowListPolicy {
    fn default() -> Self {
        Self {
            allowed: ALLOWED_HEADERS.to_vec(),
        }
    }
}

impl HeaderPolicy for AllowListPolicy {
    fn name(&self) -> &'static str {
        "allow_list"
    }

    fn filter(&self, inbound: &HeaderMap) -> HeaderMap {
        let mut outbound = HeaderMap::new();
        for name in &self.allowed {
            for value in inbound.get_all(name) {
                outbound.append(name.clone(), value.clone());
            }
        }
        outbound
    }
}

/// Copies everything except a short exclusion list.
#[derive(Debug, Clone)]
pub struct PassthroughPolicy {
    excluded: Vec<HeaderName>,
}

impl Default for PassthroughPolicy {
    fn default() -> Self {
        Self {
            excluded: vec![header::HOST],
        }
    }
}

impl HeaderPolicy for PassthroughPolicy {
    fn name(&self) -> &'static str {
        "passthrough"
    }

    fn filter(&self, inbound: &HeaderMap) -> HeaderMap {
        let mut outbound = HeaderMap::new();
        for (name, value) in inbound {
            if !self.excluded.contains(name) {
                outbound.append(name.clone(), value.clone());
            }
        }
        outbound
    }
}

/// Credentials the router presents to protected backends.
#[derive(Debug, Clone, Default)]
pub struct UpstreamCredentials {
    bypass: Option<(HeaderName, HeaderValue)>,
    bearer: Option<HeaderValue>,
}

impl UpstreamCredentials {
    pub fn from_config(config: &UpstreamConfig) -> RouterResult<Self> {
        let bypass = match &config.bypass_secret {
            Some(secret) => {
                let name = HeaderName::from_bytes(config.bypass_header.as_bytes())
                    .map_err(RouterError::internal)?;
                let mut value = HeaderValue::from_str(secret).map_err(RouterError::internal)?;
                value.set_sensitive(true);
                Some((name, value))
            }
            None => None,
        };

        let bearer = match &config.automation_token {
            Some(token) => {
                let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(RouterError::internal)?;
                value.set_sensitive(true);
                Some(value)
            }
            None => None,
        };

        Ok(Self { bypass, bearer })
    }

    /// Set the configured credential on `headers`, replacing any client value.
    pub fn apply(&self, headers: &mut HeaderMap) {
        if let Some((name, value)) = &self.bypass {
            headers.insert(name.clone(), value.clone());
        } else if let Some(value) = &self.bearer {
            headers.insert(header::AUTHORIZATION, value.clone());
        }
    }
}

/// Policy plus credentials: the full outbound header builder.
#[derive(Debug)]
pub struct OutboundHeaders {
    policy: Box<dyn HeaderPolicy>,
    credentials: UpstreamCredentials,
}

impl OutboundHeaders {
    pub fn new(policy: Box<dyn HeaderPolicy>, credentials: UpstreamCredentials) -> Self {
        Self {
            policy,
            credentials,
        }
    }

    pub fn from_config(config: &UpstreamConfig) -> RouterResult<Self> {
        let policy: Box<dyn HeaderPolicy> = match config.header_policy {
            HeaderPolicyKind::AllowList => Box::new(AllowListPolicy::default()),
            HeaderPolicyKind::Passthrough => Box::new(PassthroughPolicy::default()),
        };
        Ok(Self::new(policy, UpstreamCredentials::from_config(config)?))
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    /// Header set for the upstream request.
    pub fn build(&self, inbound: &HeaderMap) -> HeaderMap {
        let mut outbound = self.policy.filter(inbound);
        self.credentials.apply(&mut outbound);

        for (name, value) in &outbound {
            tracing::debug!(header = %name, value = ?value, "Proxy outbound header");
        }
        outbound
    }
}
