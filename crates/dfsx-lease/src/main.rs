#![warn(missing_docs)]

//! dfsx Lease Manager server binary.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use dfsx_lease::api::LeaseApi;
use dfsx_lease::config::LeaseConfig;
use dfsx_lease::lease::LeaseManager;
use dfsx_lease::store::SledLeaseStore;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "dfsx-leased")]
#[command(about = "dfsx Lease Manager server", long_about = None)]
struct Cli {
    /// Path to an optional JSON or TOML config overlay.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = LeaseConfig::load(cli.config.as_deref())?;

    tracing::info!(
        dbfile = ?config.dbfile,
        bind_addr = %config.bind_addr,
        lock_lifetime = config.lock_lifetime,
        "starting lease manager"
    );

    let store = Arc::new(SledLeaseStore::open(&config.dbfile)?);
    let manager = Arc::new(LeaseManager::new(store, Duration::from_secs(config.lock_lifetime)));
    let api = LeaseApi::new(manager);

    api.serve(config.bind_addr).await
}
