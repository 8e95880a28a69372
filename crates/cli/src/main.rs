use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{CheckConfigArgs, ResolveArgs, ServeArgs};

#[derive(Parser)]
#[command(name = "kite-bridge")]
#[command(about = "Routes trading alerts to Kite index options orders", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the webhook server
    Serve(ServeArgs),
    /// Resolve the contract an entry alert would trade, without ordering
    Resolve(ResolveArgs),
    /// Load and validate configuration
    CheckConfig(CheckConfigArgs),
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Serve(ServeArgs {
            log_file: Some(path),
            ..
        }) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(std::sync::Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        _ => {
            tracing_subscriber::fmt().with_env_filter(env_filter()).init();
        }
    }

    match cli.command {
        Commands::Serve(args) => commands::run_serve(args).await?,
        Commands::Resolve(args) => commands::run_resolve(args).await?,
        Commands::CheckConfig(args) => commands::run_check_config(&args)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn resolve_parses_decimal_price() {
        let cli = Cli::try_parse_from([
            "kite-bridge",
            "resolve",
            "--paper",
            "--symbol",
            "NSE:CNXFINANCE",
            "--side",
            "LONG",
            "--price",
            "21034.5",
        ])
        .unwrap();
        let Commands::Resolve(args) = cli.command else {
            panic!("expected resolve");
        };
        assert!(args.broker.paper);
        assert_eq!(args.price.to_string(), "21034.5");
    }

    #[test]
    fn instruments_require_paper_mode() {
        let result = Cli::try_parse_from(["kite-bridge", "serve", "--instruments", "nfo.csv"]);
        assert!(result.is_err());
    }
}
