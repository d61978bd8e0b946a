// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Nixpkgs package search
//!
//! Provides a pluggable search engine for the nixos-search backend:
//! - Request building with a typed Elasticsearch query
//! - Response normalization into [`PackageResult`] records
//! - One-time index version resolution at load time
//! - A minimal service that dispatches requests over HTTP
//!
//! Ranking across engines, retries and presentation are left to the host.

pub mod config;
pub mod engine;
pub mod index_version;
pub mod nixpkgs;
pub mod query;
pub mod service;
pub mod types;

// Re-export commonly used types
pub use config::NixpkgsConfig;
pub use engine::SearchEngine;
pub use index_version::{
    resolve_index_version, HttpVersionSource, IndexVersion, StaticVersionSource, VersionSource,
};
pub use nixpkgs::NixpkgsEngine;
pub use service::SearchService;
pub use types::{
    EngineAbout, PackageResult, RequestParams, ResultMetadata, SearchError, SearchResponse,
};
