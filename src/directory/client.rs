//! REST client for the slug directory.
//!
//! The directory is a PostgREST-style endpoint: one exact-match filter on the
//! slug, one selected column holding the origin base URL.

use std::time::Duration;

use axum::http::{header, HeaderMap, HeaderValue};
use percent_encoding::percent_decode_str;
use url::Url;

use crate::config::{DirectoryConfig, TimeoutConfig};
use crate::directory::RouteMapping;
use crate::error::{RouterError, RouterResult};

/// Resolves slugs to origins over HTTP.
#[derive(Debug, Clone)]
pub struct DirectoryClient {
    http: reqwest::Client,
    collection_url: Url,
    origin_field: String,
    headers: HeaderMap,
}

impl DirectoryClient {
    /// Build a client from validated configuration.
    pub fn new(config: &DirectoryConfig, timeouts: &TimeoutConfig) -> RouterResult<Self> {
        let collection_url = collection_url(config)?;

        let mut key = HeaderValue::from_str(&config.api_key).map_err(RouterError::internal)?;
        key.set_sensitive(true);
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
            .map_err(RouterError::internal)?;
        bearer.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert("apikey", key);
        headers.insert(header::AUTHORIZATION, bearer);
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .timeout(Duration::from_secs(timeouts.request_secs))
            .build()
            .map_err(RouterError::internal)?;

        Ok(Self {
            http,
            collection_url,
            origin_field: config.origin_field.clone(),
            headers,
        })
    }

    /// URL of the exact-match lookup for `slug`.
    ///
    /// `slug` is a raw path segment; it is decoded here and re-encoded exactly
    /// once as a query value.
    pub fn lookup_url(&self, slug: &str) -> Url {
        let slug = percent_decode_str(slug).decode_utf8_lossy();
        let mut url = self.collection_url.clone();
        url.query_pairs_mut()
            .append_pair("select", &self.origin_field)
            .append_pair("slug", &format!("eq.{}", slug));
        url
    }

    /// Look up the origin for `slug`.
    ///
    /// Transport failures, non-success statuses, undecodable bodies, empty
    /// result sets and records without an origin all surface as
    /// [`RouterError::SlugNotFound`].
    pub async fn lookup(&self, slug: &str) -> RouterResult<RouteMapping> {
        let url = self.lookup_url(slug);
        tracing::info!(slug = %slug, lookup_url = %url, "Querying directory");

        let not_found = || RouterError::SlugNotFound {
            slug: slug.to_string(),
        };

        let response = match self.http.get(url).headers(self.headers.clone()).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(slug = %slug, error = %e, "Directory request failed");
                return Err(not_found());
            }
        };

        let status = response.status();
        let records: Vec<serde_json::Value> = match response.json().await {
            Ok(records) => records,
            Err(e) => {
                tracing::error!(slug = %slug, status = %status, error = %e, "Directory returned an unreadable body");
                return Err(not_found());
            }
        };

        if !status.is_success() {
            tracing::error!(slug = %slug, status = %status, records = ?records, "Directory returned an error");
            return Err(not_found());
        }

        let origin = records
            .first()
            .and_then(|record| record.get(&self.origin_field))
            .and_then(|value| value.as_str())
            .filter(|origin| !origin.is_empty());

        match origin {
            Some(origin) => Ok(RouteMapping {
                slug: slug.to_string(),
                origin_base_url: origin.to_string(),
            }),
            None => {
                tracing::error!(slug = %slug, records = ?records, "Slug not found in directory");
                Err(not_found())
            }
        }
    }
}

fn collection_url(config: &DirectoryConfig) -> RouterResult<Url> {
    let mut raw = config.base_url.trim_end_matches('/').to_string();
    for part in [config.rest_prefix.as_str(), config.collection.as_str()] {
        let part = part.trim_matches('/');
        if !part.is_empty() {
            raw.push('/');
            raw.push_str(part);
        }
    }
    Url::parse(&raw).map_err(RouterError::internal)
}
