//! CLI commands for the options bridge.

pub mod check_config;
pub mod resolve;
pub mod serve;

pub use check_config::{run_check_config, CheckConfigArgs};
pub use resolve::{run_resolve, ResolveArgs};
pub use serve::{run_serve, ServeArgs};

use anyhow::{Context, Result};
use clap::Args;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use kite_bridge_core::{AppConfig, Broker, ConfigLoader, Segment, DEFAULT_CONFIG_PATH};
use kite_bridge_kite::{parse_instruments_csv, KiteClient, PaperBroker};

/// Options shared by every command that builds a broker.
#[derive(Args, Debug, Clone)]
pub struct BrokerArgs {
    /// Config file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Config profile overlay (loads Config.<profile>.toml next to the config file)
    #[arg(long, env = "BRIDGE_PROFILE")]
    pub profile: Option<String>,

    /// Use the in-memory paper broker instead of Kite
    #[arg(long)]
    pub paper: bool,

    /// Instrument dump (Kite CSV) to seed the paper broker with
    #[arg(long, requires = "paper")]
    pub instruments: Option<PathBuf>,
}

impl BrokerArgs {
    pub fn load_config(&self) -> Result<AppConfig> {
        let config = match &self.profile {
            Some(profile) => ConfigLoader::load_with_profile(&self.config, profile)?,
            None => ConfigLoader::load(&self.config)?,
        };
        config
            .validate(!self.paper)
            .context("Invalid configuration")?;
        Ok(config)
    }

    pub fn build_broker(&self, config: &AppConfig) -> Result<Arc<dyn Broker>> {
        if !self.paper {
            let client = KiteClient::new(&config.kite)?;
            return Ok(Arc::new(client));
        }

        let broker = match &self.instruments {
            Some(path) => {
                let file = File::open(path)
                    .with_context(|| format!("Failed to open instrument dump {}", path.display()))?;
                let instruments = parse_instruments_csv(file, Segment::NfoOpt)
                    .with_context(|| format!("Failed to parse instrument dump {}", path.display()))?;
                tracing::info!(
                    path = %path.display(),
                    instruments = instruments.len(),
                    "Paper broker seeded"
                );
                PaperBroker::with_instruments(instruments)
            }
            None => {
                tracing::warn!("Paper broker has no instruments; entries will fail to resolve");
                PaperBroker::new()
            }
        };
        Ok(Arc::new(broker))
    }
}
