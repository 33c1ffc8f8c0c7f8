//! Workboard backend server.
//!
//! Task-management backend with employee load tracking and assignment
//! recommendations for unassigned sub-tasks.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use workboard::api::start_server;
use workboard::config::Config;
use workboard::db::Database;

#[derive(Parser)]
#[command(name = "workboard", version, about = "Task-management backend server")]
struct Cli {
    /// Path to the configuration file (YAML).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to the SQLite database file (overrides config).
    #[arg(long)]
    db: Option<PathBuf>,

    /// Port for the HTTP API (overrides config).
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(),
    };
    if let Some(db) = cli.db {
        config.server.db_path = db;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    config.ensure_db_dir()?;
    let db = Database::open(&config.server.db_path)?;
    info!("opened database at {}", config.server.db_path.display());

    let (shutdown_tx, _addr) = start_server(db, config).await?;

    tokio::signal::ctrl_c().await?;
    info!("received ctrl-c, shutting down");
    let _ = shutdown_tx.send(());

    Ok(())
}
