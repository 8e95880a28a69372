//! Runs the webhook server.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

use kite_bridge_core::Segment;
use kite_bridge_router::OrderRouter;
use kite_bridge_web_api::ApiServer;

use super::BrokerArgs;

#[derive(Args, Debug)]
pub struct ServeArgs {
    #[command(flatten)]
    pub broker: BrokerArgs,

    /// Override the listen address (host:port)
    #[arg(long)]
    pub addr: Option<String>,

    /// Optional log file path (logs to file instead of stderr)
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let config = args.broker.load_config()?;
    let broker = args.broker.build_broker(&config)?;
    let router = OrderRouter::new(broker, &config).context("Failed to build order router")?;

    // Warm the cache before the first alert arrives.
    match router.cache().get(Segment::NfoOpt).await {
        Ok(snapshot) => tracing::info!(instruments = snapshot.len(), "Instrument cache warmed"),
        Err(e) => tracing::warn!(error = %e, "Instrument cache warm-up failed, will retry on demand"),
    }

    let addr = args.addr.unwrap_or_else(|| config.server.addr());
    tracing::info!(
        addr = %addr,
        paper = args.broker.paper,
        roots = config.roots.len(),
        "Starting options bridge"
    );

    ApiServer::new(Arc::new(router)).serve(&addr).await
}
