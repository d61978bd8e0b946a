// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Search engine trait definition

use super::types::{EngineAbout, PackageResult, RequestParams, SearchError};

/// Trait for implementing pluggable search engines
///
/// An engine translates a free-text query into a request for its backend
/// and the backend's raw response into normalized results. Both operations
/// are pure: the host performs the I/O, enforces timeouts and decides what
/// to do with failures. Engines hold only immutable configuration, so one
/// instance can serve concurrent queries.
pub trait SearchEngine: Send + Sync {
    /// Get the engine name for logging
    fn name(&self) -> &'static str;

    /// Descriptive information about the backend
    fn about(&self) -> &EngineAbout;

    /// Categories this engine serves
    fn categories(&self) -> &'static [&'static str];

    /// Build the backend request for `query`
    ///
    /// # Arguments
    /// * `query` - The search query, passed through as data
    /// * `params` - Host-prepared request template
    ///
    /// # Returns
    /// The completed request descriptor, ready to dispatch
    fn request(&self, query: &str, params: RequestParams) -> Result<RequestParams, SearchError>;

    /// Parse a raw backend response body
    ///
    /// # Returns
    /// Normalized results in backend order, or the backend/field error
    fn response(&self, body: &str) -> Result<Vec<PackageResult>, SearchError>;
}
