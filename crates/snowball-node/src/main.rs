//! Snowball Node - repeated-sampling consensus node.
//!
//! This is the main entry point for running a Snowball node.

use anyhow::Context;
use clap::Parser;
use snowball_node::cli::Cli;
use snowball_node::observability::{init_logging, LogFormat};
use snowball_node::Node;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, LogFormat::parse(&cli.log_format));

    let config = match cli.resolve() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return Err(e).context("invalid configuration");
        }
    };

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting Snowball node");

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, shutting down");
                cancel.cancel();
            }
        });
    }

    let node = Node::start(config).await.context("cannot start node")?;
    let report = node.run(cancel).await.context("node run failed")?;

    tracing::info!(
        path = %report.output.display(),
        decided = report.decided.len(),
        peers_pending = report.sweep.pending.len(),
        "Node finished"
    );
    Ok(())
}
