#![warn(missing_docs)]

//! dfsx Directory Registry server binary.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use dfsx_registry::api::RegistryApi;
use dfsx_registry::config::RegistryConfig;
use dfsx_registry::directory::DirectoryRegistry;
use dfsx_registry::store::SledRegistryStore;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "dfsx-registryd")]
#[command(about = "dfsx Directory Registry server", long_about = None)]
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
    let config = RegistryConfig::load(cli.config.as_deref())?;

    tracing::info!(dbfile = ?config.dbfile, bind_addr = %config.bind_addr, "starting directory registry");

    let store = Arc::new(SledRegistryStore::open(&config.dbfile)?);
    let registry = Arc::new(DirectoryRegistry::new(store));
    let api = RegistryApi::new(registry);

    api.serve(config.bind_addr).await
}
