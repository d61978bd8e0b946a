// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Configuration for the nixpkgs search engine

use std::env;
use std::path::Path;
use std::time::Duration;

use reqwest::header::HeaderValue;
use serde::Deserialize;
use url::Url;

use super::types::SearchError;

/// Default backend root
pub const DEFAULT_BASE_URL: &str = "https://search.nixos.org/backend";
/// Default channel
pub const DEFAULT_CHANNEL: &str = "unstable";
/// Location of the index schema version published by nixos-search
pub const DEFAULT_VERSION_URL: &str =
    "https://raw.githubusercontent.com/NixOS/nixos-search/master/VERSION";
/// Maximum page size accepted by the backend (`index.max_result_window`)
pub const MAX_PAGE_SIZE: u32 = 10_000;

/// Configuration for the nixpkgs search engine
///
/// Read once when the engine is constructed and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NixpkgsConfig {
    /// Root URL of the search backend
    pub base_url: String,
    /// Nix channel to search (e.g. "unstable", "24.05")
    pub channel: String,
    /// Attach backend diagnostics to each result
    pub show_metadata: bool,
    /// Value of the `Authorization` header sent to the backend
    pub authorization: Option<String>,
    /// URL the index version is fetched from at load time
    pub version_url: String,
    /// Explicit index name; skips version resolution when set
    pub index: Option<String>,
    /// Hits requested per page
    pub page_size: u32,
    /// Timeout for each search request in milliseconds
    pub request_timeout_ms: u64,
    /// Timeout for the load-time version fetch in milliseconds
    pub version_timeout_ms: u64,
}

impl Default for NixpkgsConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            channel: DEFAULT_CHANNEL.to_string(),
            show_metadata: false,
            authorization: None,
            version_url: DEFAULT_VERSION_URL.to_string(),
            index: None,
            page_size: 50,
            request_timeout_ms: 10000,
            version_timeout_ms: 5000,
        }
    }
}

impl NixpkgsConfig {
    /// Load configuration from environment variables on top of defaults
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Load configuration from a TOML file
    ///
    /// Keys may sit at the top level or under a `[nixpkgs]` table.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SearchError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| SearchError::Config {
            reason: format!("cannot read {}: {}", path.display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, SearchError> {
        let value: toml::Value = toml::from_str(content).map_err(|e| SearchError::Config {
            reason: format!("invalid TOML: {}", e),
        })?;

        let table = match value.get("nixpkgs") {
            Some(section) => section.clone(),
            None => value,
        };

        table.try_into().map_err(|e: toml::de::Error| SearchError::Config {
            reason: format!("invalid nixpkgs settings: {}", e),
        })
    }

    /// Overlay values from environment variables
    pub fn apply_env(&mut self) {
        if let Ok(val) = env::var("NIXPKGS_SEARCH_BASE_URL") {
            self.base_url = val;
        }
        if let Ok(val) = env::var("NIXPKGS_SEARCH_CHANNEL") {
            self.channel = val;
        }
        if let Ok(val) = env::var("NIXPKGS_SEARCH_SHOW_METADATA") {
            self.show_metadata = matches!(val.to_lowercase().as_str(), "true" | "1" | "yes");
        }
        if let Ok(val) = env::var("NIXPKGS_SEARCH_AUTH") {
            self.authorization = Some(val).filter(|v| !v.is_empty());
        }
        if let Ok(val) = env::var("NIXPKGS_SEARCH_VERSION_URL") {
            self.version_url = val;
        }
        if let Ok(val) = env::var("NIXPKGS_SEARCH_INDEX") {
            self.index = Some(val).filter(|v| !v.is_empty());
        }
        if let Some(num) = env::var("NIXPKGS_SEARCH_PAGE_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.page_size = num;
        }
        if let Some(num) = env::var("NIXPKGS_SEARCH_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.request_timeout_ms = num;
        }
        if let Some(num) = env::var("NIXPKGS_SEARCH_VERSION_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.version_timeout_ms = num;
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), SearchError> {
        validate_http_url("base_url", &self.base_url)?;
        if self.index.is_none() {
            validate_http_url("version_url", &self.version_url)?;
        }

        if !is_index_component(&self.channel) {
            return Err(config_error(format!(
                "channel must be non-empty and contain only [A-Za-z0-9._-], got {:?}",
                self.channel
            )));
        }
        if let Some(index) = &self.index {
            if !is_index_component(index) {
                return Err(config_error(format!("invalid index name {:?}", index)));
            }
        }

        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(config_error(format!(
                "page_size must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }
        if self.request_timeout_ms == 0 {
            return Err(config_error("request_timeout_ms must be greater than 0"));
        }
        if self.version_timeout_ms == 0 {
            return Err(config_error("version_timeout_ms must be greater than 0"));
        }

        self.authorization_header()?;
        Ok(())
    }

    /// The credential as a header value, if one is configured
    pub fn authorization_header(&self) -> Result<Option<HeaderValue>, SearchError> {
        self.authorization
            .as_deref()
            .map(|value| {
                let mut header = HeaderValue::from_str(value)
                    .map_err(|_| config_error("authorization is not a valid header value"))?;
                header.set_sensitive(true);
                Ok(header)
            })
            .transpose()
    }

    /// Timeout for each search request
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Timeout for the load-time version fetch
    pub fn version_timeout(&self) -> Duration {
        Duration::from_millis(self.version_timeout_ms)
    }
}

/// Characters allowed in index name components
pub(crate) fn is_index_component(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

fn validate_http_url(field: &str, value: &str) -> Result<(), SearchError> {
    let url = Url::parse(value)
        .map_err(|e| config_error(format!("{} is not a valid URL ({}): {}", field, value, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(config_error(format!(
            "{} has unsupported scheme {}",
            field, scheme
        ))),
    }
}

fn config_error(reason: impl Into<String>) -> SearchError {
    SearchError::Config {
        reason: reason.into(),
    }
}
