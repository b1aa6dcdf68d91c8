//! gitup - update resolution for plugins and themes hosted on GitLab and GitHub.

mod cli;
mod commands;
mod local;
mod remote;
mod text;
mod types;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use local::LocalConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Controlled by RUST_LOG; logs go to stderr so reports stay pipeable
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => LocalConfig::config_path()?,
    };
    cli.command.execute(&config_path).await
}
