//! Tessera CLI - host capability modules and serve their tools over MCP

mod host;
mod modules;

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tessera_core::mcp::{McpServer, StdioTransport};
use tessera_core::prelude::*;
use tracing::info;

use crate::host::Host;

#[derive(Parser)]
#[command(name = "tessera")]
#[command(about = "Capability module host", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (replaces the default search path)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Default access mode for modules that do not declare one
    #[arg(short, long, global = true, env = "TESSERA_DEFAULT_MODE")]
    mode: Option<AccessMode>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Activate configured modules and serve MCP on stdio
    Serve,
    /// Print the tools configured modules expose
    Tools,
    /// Print module health
    Health,
    /// Version information
    Version,
}

#[derive(Serialize)]
struct ToolRow {
    module: String,
    name: String,
    description: String,
    mutates: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries protocol traffic
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if matches!(cli.command, Commands::Version) {
        println!("tessera {}", env!("CARGO_PKG_VERSION"));
        println!("tessera-core {}", tessera_core::VERSION);
        return Ok(());
    }

    let mut config = match &cli.config {
        Some(path) => HostConfig::from_file(path)?,
        None => HostConfig::load()?,
    };
    if let Some(mode) = cli.mode {
        config.registry.default_mode = mode;
    }

    let host = Host::start(&config, Arc::new(ProcessEnv)).await?;

    match cli.command {
        Commands::Serve => {
            let server = McpServer::builder()
                .name(config.server.name.clone())
                .version(config.server.version.clone())
                .with_catalog(host.catalog.clone())
                .build();

            info!(name = %config.server.name, "Serving MCP on stdio");
            let served = server.run(StdioTransport::new()).await;
            let report = host.stop().await;
            info!(removed = report.removed.len(), failed = report.failures.len(), "Shutdown complete");
            served?;
        }
        Commands::Tools => {
            let mut rows = Vec::new();
            for module in host.registry.list_all() {
                for name in module.published_tools() {
                    if let Some(tool) = host.catalog.get(name).await {
                        rows.push(ToolRow {
                            module: module.name().to_string(),
                            name: name.clone(),
                            description: tool.description().to_string(),
                            mutates: tool.mutates(),
                        });
                    }
                }
            }
            println!("{}", serde_json::to_string_pretty(&rows)?);
            host.stop().await;
        }
        Commands::Health => {
            let health = host.registry.health_check_all().await;
            println!("{}", serde_json::to_string_pretty(&health)?);
            host.stop().await;
        }
        Commands::Version => {}
    }

    Ok(())
}
