// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Load-time resolution of the backend index version
//!
//! The nixos-search backend names its indices after a schema version that
//! is published separately. The version is resolved once, before the engine
//! is constructed, through a [`VersionSource`] so hosts and tests can
//! substitute their own.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use super::config::is_index_component;
use super::types::SearchError;

/// A validated index version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexVersion(String);

impl IndexVersion {
    /// Validate raw version text
    ///
    /// Surrounding whitespace is trimmed. Anything that is not usable as an
    /// index name component is rejected rather than truncated.
    pub fn parse(raw: &str, source_name: &str) -> Result<Self, SearchError> {
        let version = raw.trim();
        if version.is_empty() {
            return Err(SearchError::VersionResolution {
                source_name: source_name.to_string(),
                reason: "version is empty".to_string(),
            });
        }
        if !is_index_component(version) {
            return Err(SearchError::VersionResolution {
                source_name: source_name.to_string(),
                reason: format!("version {:?} is not a valid index component", version),
            });
        }
        Ok(Self(version.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Index name for a channel, e.g. `latest-42-nixos-unstable`
    pub fn index_name(&self, channel: &str) -> String {
        format!("latest-{}-nixos-{}", self.0, channel)
    }
}

impl fmt::Display for IndexVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source of the raw index version text
#[async_trait]
pub trait VersionSource: Send + Sync {
    /// Fetch the raw version text
    async fn fetch(&self) -> Result<String, SearchError>;

    /// Human-readable description for logs and errors
    fn describe(&self) -> String;
}

/// Fetches the version file over HTTP
pub struct HttpVersionSource {
    url: String,
    client: Client,
    timeout: Duration,
}

impl HttpVersionSource {
    /// Create a source reading from `url`
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(crate::version::user_agent())
            .build()
            .map_err(|e| SearchError::Http {
                status: 0,
                message: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            url: url.into(),
            client,
            timeout,
        })
    }
}

#[async_trait]
impl VersionSource for HttpVersionSource {
    async fn fetch(&self) -> Result<String, SearchError> {
        let failed = |reason: String| SearchError::VersionResolution {
            source_name: self.url.clone(),
            reason,
        };
        let transport = |e: reqwest::Error| {
            if e.is_timeout() {
                SearchError::from_transport(e, self.timeout)
            } else {
                failed(e.to_string())
            }
        };

        let response = self.client.get(&self.url).send().await.map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(failed(format!("unexpected status {}", status)));
        }

        response.text().await.map_err(transport)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// A version known up front, e.g. pinned in configuration
#[derive(Debug, Clone)]
pub struct StaticVersionSource(pub String);

#[async_trait]
impl VersionSource for StaticVersionSource {
    async fn fetch(&self) -> Result<String, SearchError> {
        Ok(self.0.clone())
    }

    fn describe(&self) -> String {
        "static version".to_string()
    }
}

/// Resolve the index version once, bounded by `timeout`
pub async fn resolve_index_version(
    source: &dyn VersionSource,
    timeout: Duration,
) -> Result<IndexVersion, SearchError> {
    let source_name = source.describe();
    debug!("Resolving index version from {}", source_name);

    let raw = tokio::time::timeout(timeout, source.fetch())
        .await
        .map_err(|_| SearchError::Timeout {
            timeout_ms: timeout.as_millis() as u64,
        })??;

    let version = IndexVersion::parse(&raw, &source_name)?;
    info!("Resolved index version {} from {}", version, source_name);
    Ok(version)
}
