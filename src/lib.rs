// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod cli;
pub mod search;
pub mod version;

// Re-export main types
pub use search::{
    IndexVersion, NixpkgsConfig, NixpkgsEngine, PackageResult, RequestParams, SearchEngine,
    SearchError, SearchResponse, SearchService, VersionSource,
};
