// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use crate::search::{NixpkgsConfig, NixpkgsEngine, PackageResult, SearchService};

/// Search nixpkgs from the command line
#[derive(Parser, Debug)]
#[command(name = "nixpkgs-search")]
#[command(version)]
#[command(about = "Search the nixpkgs package index", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub settings: SettingsArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Settings that override the config file and environment
#[derive(Args, Debug, Default)]
pub struct SettingsArgs {
    /// TOML configuration file
    #[arg(long, global = true, env = "NIXPKGS_SEARCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Backend root URL
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Nix channel to search (e.g. unstable, 24.05)
    #[arg(long, global = true)]
    pub channel: Option<String>,

    /// Index to search; skips fetching the index version
    #[arg(long, global = true)]
    pub index: Option<String>,

    /// Attach backend diagnostics to each result
    #[arg(long, global = true)]
    pub show_metadata: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search for packages
    Search(SearchArgs),

    /// Print the request that would be sent, without sending it
    ///
    /// The index version is still fetched unless `--index` is given.
    Request(RequestArgs),

    /// Resolve and print the index being searched
    Index,
}

/// Arguments for the search command
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Free-text query
    pub query: String,

    /// Result page, starting at 1
    #[arg(long, default_value = "1")]
    pub page: u32,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the request command
#[derive(Args, Debug)]
pub struct RequestArgs {
    /// Free-text query
    pub query: String,

    /// Result page, starting at 1
    #[arg(long, default_value = "1")]
    pub page: u32,
}

impl SettingsArgs {
    /// Resolve configuration: file, then environment, then flags
    pub fn load(&self) -> Result<NixpkgsConfig> {
        let mut config = match &self.config {
            Some(path) => NixpkgsConfig::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => NixpkgsConfig::default(),
        };
        config.apply_env();
        self.apply(config)
    }

    /// Override `config` with the flags that were given, then validate
    pub fn apply(&self, mut config: NixpkgsConfig) -> Result<NixpkgsConfig> {
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(channel) = &self.channel {
            config.channel = channel.clone();
        }
        if let Some(index) = &self.index {
            config.index = Some(index.clone());
        }
        if self.show_metadata {
            config.show_metadata = true;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Execute CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let config = cli.settings.load()?;
    let engine = NixpkgsEngine::from_config(&config)
        .await
        .context("initializing nixpkgs engine")?;
    info!("Using index {}", engine.index());

    match cli.command {
        Commands::Index => {
            println!("{}", engine.index());
            println!("{}", engine.search_url());
        }
        Commands::Request(args) => {
            let service = SearchService::new(Arc::new(engine), config.request_timeout())?;
            let params = service.prepare(&args.query, args.page)?;
            println!("{} {}", params.method, params.url);
            for (name, value) in &params.headers {
                let shown = if value.is_sensitive() {
                    "<redacted>"
                } else {
                    value.to_str().unwrap_or("<binary>")
                };
                println!("{}: {}", name, shown);
            }
            println!();
            println!("{}", params.body);
        }
        Commands::Search(args) => {
            let service = SearchService::new(Arc::new(engine), config.request_timeout())?;
            let response = service.search(&args.query, Some(args.page)).await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                for result in &response.results {
                    println!("{}", format_result(result));
                }
                println!(
                    "{} results in {}ms",
                    response.result_count, response.search_time_ms
                );
            }
        }
    }

    Ok(())
}

/// Render a result as a short text block
pub fn format_result(result: &PackageResult) -> String {
    let mut lines = vec![format!("{} ({})", result.title, result.version)];
    if !result.content.is_empty() {
        lines.push(format!("  {}", result.content));
    }
    if let Some(homepage) = &result.homepage {
        lines.push(format!("  homepage: {}", homepage));
    }
    if !result.license_name.is_empty() {
        lines.push(format!("  license: {}", result.license_name));
    }
    if !result.source_code_url.is_empty() {
        lines.push(format!("  source: {}", result.source_code_url));
    }
    lines.push(format!("  $ {}", result.shell_command()));
    lines.join("\n")
}
