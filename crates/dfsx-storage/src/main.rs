#![warn(missing_docs)]

//! dfsx Storage Node server binary.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use dfsx_storage::api::StorageApi;
use dfsx_storage::config::StorageConfig;
use dfsx_storage::node::StorageNode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "dfsx-storaged")]
#[command(about = "dfsx Storage Node server", long_about = None)]
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
    let config = StorageConfig::load(cli.config.as_deref())?;

    tracing::info!(
        fsroot = ?config.fsroot,
        bind_addr = %config.bind_addr,
        directories = ?config.directories,
        "starting storage node"
    );

    std::fs::create_dir_all(&config.fsroot)?;

    let node = Arc::new(StorageNode::new(
        config.fsroot.clone(),
        config.directories.clone(),
        config.lockserver.clone(),
    ));

    if let Err(e) = node.register_with_registry(&config.nameserver, &config.srv).await {
        tracing::warn!(error = %e, "failed to register with directory registry at startup");
    }

    let api = StorageApi::new(node);
    api.serve(config.bind_addr).await
}
