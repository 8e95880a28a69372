//! Dry-run contract resolution: shows what an entry alert would trade.

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use clap::Args;
use rust_decimal::Decimal;

use kite_bridge_core::Side;
use kite_bridge_router::OrderRouter;

use super::BrokerArgs;

#[derive(Args, Debug)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub broker: BrokerArgs,

    /// Alert symbol, e.g. NSE:CNXFINANCE
    #[arg(long)]
    pub symbol: String,

    /// LONG or SHORT
    #[arg(long)]
    pub side: String,

    /// Reference price of the underlying
    #[arg(long)]
    pub price: Decimal,
}

pub async fn run_resolve(args: ResolveArgs) -> Result<()> {
    let config = args.broker.load_config()?;
    let broker = args.broker.build_broker(&config)?;
    let router = OrderRouter::new(broker, &config).context("Failed to build order router")?;

    let root = router
        .root_for(&args.symbol)
        .ok_or_else(|| anyhow!("Unsupported symbol: {}", args.symbol))?
        .clone();
    let side: Side = args.side.parse().map_err(|e: String| anyhow!(e))?;
    if !side.is_entry() {
        anyhow::bail!("Only LONG and SHORT resolve to a contract");
    }

    let entry = router
        .resolve_entry(&root, side, args.price, Utc::now())
        .await
        .context("Contract resolution failed")?;

    if entry.instrument.strike != entry.target_strike {
        tracing::info!(
            target = entry.target_strike,
            strike = entry.instrument.strike,
            "Target strike not listed, neighbor selected"
        );
    }
    println!("{}", serde_json::to_string_pretty(&entry)?);

    Ok(())
}
