// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Core types shared by search engines and their host

use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default timeout applied to a dispatched search request
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Request descriptor handed to an engine and returned for dispatch
///
/// The host fills in defaults (headers, timeout, page number) and the
/// engine sets the target and payload. Engines never perform I/O; the host
/// owns the descriptor once `request` returns.
#[derive(Debug, Clone)]
pub struct RequestParams {
    /// HTTP method to use
    pub method: Method,
    /// Fully qualified target URL
    pub url: String,
    /// Serialized request payload
    pub body: String,
    /// Request headers, one value per name
    pub headers: HeaderMap,
    /// 1-based result page requested by the caller
    pub pageno: u32,
    /// Timeout the host applies when dispatching
    pub timeout: Duration,
}

impl Default for RequestParams {
    fn default() -> Self {
        Self {
            method: Method::GET,
            url: String::new(),
            body: String::new(),
            headers: HeaderMap::new(),
            pageno: 1,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl RequestParams {
    /// Create a descriptor for the given page
    pub fn for_page(pageno: u32) -> Self {
        Self {
            pageno: pageno.max(1),
            ..Self::default()
        }
    }

    /// Set the dispatch timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// A normalized package search result
///
/// Every result produced by an engine carries the same field set. Missing
/// backend fields appear as empty strings, empty lists or `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageResult {
    /// Attribute path of the package (e.g. `python3Packages.requests`)
    pub title: String,
    /// Package name without attribute prefix
    pub package_name: String,
    /// Package version
    pub version: String,
    /// Short description
    pub content: String,
    /// Link to the package definition in the source repository
    pub source_code_url: String,
    /// Link to the package page on the search frontend
    pub url: String,
    /// Maintainers, joined with ", "
    pub maintainer: String,
    /// Programs provided by the package
    pub tags: Vec<String>,
    /// License names, joined with ", "
    pub license_name: String,
    /// Upstream homepage if the package declares one
    pub homepage: Option<String>,
    /// Backend diagnostics, present only when enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ResultMetadata>,
}

impl PackageResult {
    /// Shell command that brings the package into scope
    pub fn shell_command(&self) -> String {
        format!("nix-shell -p {}", self.package_name)
    }
}

/// Per-result diagnostic data reported by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultMetadata {
    /// Index the hit came from
    pub index: String,
    /// Backend document id
    pub id: String,
    /// Relevance score
    pub score: Option<f64>,
}

/// Descriptive information about an engine
#[derive(Debug, Clone, Serialize)]
pub struct EngineAbout {
    /// Public website of the backend
    pub website: &'static str,
    /// Whether the engine talks to a documented, official API
    pub use_official_api: bool,
    /// Whether the backend requires a credential
    pub require_api_key: bool,
    /// Format of the backend response
    pub results: &'static str,
    /// Presentation template for results
    pub template: &'static str,
}

/// Response from a dispatched search
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    /// The original search query
    pub query: String,
    /// Normalized results in backend order
    pub results: Vec<PackageResult>,
    /// Time taken for the search in milliseconds
    pub search_time_ms: u64,
    /// Engine that produced the results
    pub engine: String,
    /// Number of results returned
    pub result_count: usize,
}

/// Errors that can occur while building, dispatching or parsing a search
#[derive(Debug, Error)]
pub enum SearchError {
    /// The backend reported an application-level error
    #[error("Backend API error: {message}")]
    BackendApi {
        /// Error message as reported by the backend
        message: String,
    },

    /// A result field is present but does not have the expected shape
    #[error("Malformed field {field}: {reason} (value: {value:?})")]
    MalformedField {
        /// Backend field name
        field: String,
        /// Offending value
        value: String,
        /// What was wrong with it
        reason: String,
    },

    /// The index version could not be resolved at load time
    #[error("Failed to resolve index version from {source_name}: {reason}")]
    VersionResolution {
        /// Where the version was read from
        source_name: String,
        /// Why resolution failed
        reason: String,
    },

    /// The backend request could not be built
    #[error("Invalid backend request: {reason}")]
    InvalidRequest {
        /// Encoder error
        reason: String,
    },

    /// The backend response body could not be decoded
    #[error("Invalid backend response: {reason}")]
    InvalidResponse {
        /// Decoder error
        reason: String,
    },

    /// HTTP transport or status failure
    #[error("HTTP error: {status} - {message}")]
    Http {
        /// HTTP status code, 0 when no response was received
        status: u16,
        /// Error message
        message: String,
    },

    /// Request timed out
    #[error("Search timeout after {timeout_ms}ms")]
    Timeout {
        /// Timeout duration in milliseconds
        timeout_ms: u64,
    },

    /// Invalid configuration
    #[error("Configuration error: {reason}")]
    Config {
        /// What is wrong with the configuration
        reason: String,
    },
}

impl SearchError {
    /// Map a transport error from `reqwest`
    pub(crate) fn from_transport(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                timeout_ms: timeout.as_millis() as u64,
            }
        } else {
            Self::Http {
                status: err.status().map(|s| s.as_u16()).unwrap_or(0),
                message: err.to_string(),
            }
        }
    }
}
