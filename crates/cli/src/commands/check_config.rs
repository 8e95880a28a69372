//! Loads and validates configuration without starting anything.

use anyhow::Result;
use clap::Args;

use super::BrokerArgs;

#[derive(Args, Debug)]
pub struct CheckConfigArgs {
    #[command(flatten)]
    pub broker: BrokerArgs,
}

pub fn run_check_config(args: &CheckConfigArgs) -> Result<()> {
    let config = args.broker.load_config()?;

    println!("Configuration OK ({})", args.broker.config.display());
    println!("  listen        {}", config.server.addr());
    println!(
        "  broker        {}",
        if args.broker.paper { "paper" } else { config.kite.api_url.as_str() }
    );
    println!(
        "  session       {}-{} ({})",
        config.session.open,
        config.session.close,
        config
            .session
            .utc_offset_minutes
            .map_or_else(|| "local time".to_string(), |m| format!("UTC{m:+} min"))
    );
    println!("  cache ttl     {}s", config.router.instrument_ttl_secs);
    println!(
        "  dedup horizon {}",
        config
            .router
            .dedup_horizon_secs
            .map_or_else(|| "none".to_string(), |s| format!("{s}s"))
    );
    for root in &config.roots {
        println!(
            "  root          {} -> {} (step {})",
            root.alert_symbol, root.root, root.strike_step
        );
    }

    Ok(())
}
