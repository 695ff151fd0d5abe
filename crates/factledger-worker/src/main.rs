//! Factledger maintenance worker
//!
//! Refreshes current-facts snapshots and runs confidence calibration on a
//! schedule until interrupted.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use factledger_worker::{MaintenanceWorker, WorkerConfig};
use tracing_subscriber::EnvFilter;

/// Factledger background maintenance worker
#[derive(Debug, Parser)]
#[command(name = "factledger-worker")]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, env = "FACTLEDGER_CONFIG")]
    config: Option<PathBuf>,

    /// Database path (overrides the configuration file)
    #[arg(short, long, env = "FACTLEDGER_DB")]
    database: Option<PathBuf>,

    /// Run one refresh pass and one calibration run, then exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Log to stderr; RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => WorkerConfig::from_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => WorkerConfig::default(),
    };
    if let Some(database) = args.database {
        config.worker.database_path = database;
    }

    let mut worker = MaintenanceWorker::from_config(&config).with_context(|| {
        format!("opening database {}", config.worker.database_path.display())
    })?;

    if args.once {
        worker.run_once()?;
        println!("{}", worker.metrics().summary());
    } else {
        worker.run().await?;
    }

    Ok(())
}
