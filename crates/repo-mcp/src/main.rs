//! Multi-repository MCP gateway
//!
//! Discovers the repositories around the working directory and serves
//! their tools to an MCP client over stdio.
//!
//! # Usage
//!
//! ```bash
//! repo-gateway [--config <file>] [--repos-path <dir>] [--eager]
//! ```
//!
//! # Environment Variables
//!
//! - `MULTI_REPO_MCP_CONFIG`: configuration file (same as `--config`)
//! - `MULTI_REPO_MCP_REPOS_PATH`: extra discovery root (same as `--repos-path`)
//! - `RUST_LOG`: log filter (default: `repo_gateway=info` and the gateway crates)
//!
//! Requests and responses use stdout; logs go to stderr.

use std::path::PathBuf;

use clap::Parser;
use repo_core::{Environment, Gateway};
use repo_meta::ConfigLoader;
use repo_meta::config::{ENV_CONFIG_PATH, ENV_REPOS_PATH};
use repo_mcp::GatewayServer;

/// MCP gateway over multiple repositories
#[derive(Parser)]
#[command(name = "repo-gateway")]
#[command(about = "MCP gateway exposing tools from multiple repositories")]
#[command(version)]
struct Args {
    /// Configuration file, consulted after the local and home files
    #[arg(short, long, env = ENV_CONFIG_PATH)]
    config: Option<PathBuf>,

    /// Additional directory to scan for repositories
    #[arg(long, env = ENV_REPOS_PATH)]
    repos_path: Option<PathBuf>,

    /// Resolve every repository's tools at startup
    #[arg(long)]
    eager: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    repo_mcp::logging::init()?;

    let args = Args::parse();

    let env = Environment::from_process()?.with_repos_path(args.repos_path);
    let loaded = ConfigLoader::new(&env.cwd)
        .with_env_config(args.config)
        .load();
    let mut config = loaded.config;
    if args.eager {
        config.tools.lazy_load = false;
    }

    tracing::info!(
        cwd = ?env.cwd,
        source = %loaded.source,
        lazy = config.tools.lazy_load,
        "Starting repo-gateway"
    );

    let gateway = Gateway::new(config, env);
    gateway.initialize().await?;

    GatewayServer::new(gateway).run().await?;
    Ok(())
}
