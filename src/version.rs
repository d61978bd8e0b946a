// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for nixpkgs-search

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Semantic version number
pub const VERSION_NUMBER: &str = env!("CARGO_PKG_VERSION");

/// Engines bundled in this version
pub const ENGINES: &[&str] = &["nixpkgs"];

/// User-Agent sent with every outbound request
pub fn user_agent() -> String {
    format!("{}/{}", NAME, VERSION_NUMBER)
}

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("nixpkgs-search {} (engines: {})", VERSION_NUMBER, ENGINES.join(", "))
}
