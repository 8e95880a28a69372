use chrono::{FixedOffset, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;

use crate::order::Product;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub kite: KiteConfig,
    pub router: RouterConfig,
    pub session: SessionConfig,
    pub roots: Vec<RootMapping>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KiteConfig {
    pub api_url: String,
    pub api_key: String,
    pub access_token: String,
    pub request_timeout_secs: u64,
    pub requests_per_second: u32,
    /// Exchange orders are routed to and positions are matched against.
    pub exchange: String,
    pub product: Product,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    pub instrument_ttl_secs: u64,
    pub lots_per_entry: u32,
    /// Age after which remembered signal ids are forgotten. `None` keeps them forever.
    pub dedup_horizon_secs: Option<u64>,
    /// Shared secret alerts must carry in their `passphrase` field.
    pub passphrase: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Session open, `HH:MM`, inclusive.
    pub open: String,
    /// Last minute entries are allowed, `HH:MM`, inclusive.
    pub close: String,
    /// Fixed offset for session times. `None` uses the process time zone.
    pub utc_offset_minutes: Option<i32>,
}

/// Maps an alert source's symbol onto an option root and its strike grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootMapping {
    pub alert_symbol: String,
    pub root: String,
    pub strike_step: u32,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            kite: KiteConfig::default(),
            router: RouterConfig::default(),
            session: SessionConfig::default(),
            roots: RootMapping::defaults(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl Default for KiteConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.kite.trade".to_string(),
            api_key: String::new(),
            access_token: String::new(),
            request_timeout_secs: 10,
            requests_per_second: 8,
            exchange: "NFO".to_string(),
            product: Product::Mis,
        }
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            instrument_ttl_secs: 300,
            lots_per_entry: 1,
            dedup_horizon_secs: None,
            passphrase: None,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            open: "09:15".to_string(),
            close: "15:29".to_string(),
            utc_offset_minutes: None,
        }
    }
}

impl RootMapping {
    #[must_use]
    pub fn new(alert_symbol: &str, root: &str, strike_step: u32) -> Self {
        Self {
            alert_symbol: alert_symbol.to_string(),
            root: root.to_string(),
            strike_step,
        }
    }

    #[must_use]
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("NSE:NIFTY", "NIFTY", 50),
            Self::new("NSE:CNXFINANCE", "FINNIFTY", 50),
        ]
    }
}

impl ServerConfig {
    #[must_use]
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl KiteConfig {
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl RouterConfig {
    #[must_use]
    pub const fn instrument_ttl(&self) -> Duration {
        Duration::from_secs(self.instrument_ttl_secs)
    }

    #[must_use]
    pub fn dedup_horizon(&self) -> Option<Duration> {
        self.dedup_horizon_secs.map(Duration::from_secs)
    }
}

impl SessionConfig {
    /// # Errors
    /// Returns an error if `open` is not `HH:MM`.
    pub fn open_time(&self) -> Result<NaiveTime, ConfigError> {
        parse_hhmm("session.open", &self.open)
    }

    /// # Errors
    /// Returns an error if `close` is not `HH:MM`.
    pub fn close_time(&self) -> Result<NaiveTime, ConfigError> {
        parse_hhmm("session.close", &self.close)
    }

    /// # Errors
    /// Returns an error if the offset is outside +/- 24h.
    pub fn utc_offset(&self) -> Result<Option<FixedOffset>, ConfigError> {
        self.utc_offset_minutes
            .map(|minutes| {
                FixedOffset::east_opt(minutes * 60).ok_or_else(|| ConfigError::InvalidValue {
                    field: "session.utc_offset_minutes",
                    reason: format!("{minutes} is out of range"),
                })
            })
            .transpose()
    }
}

impl AppConfig {
    /// Checks cross-field invariants that serde cannot express.
    ///
    /// Broker credentials are only required when `require_credentials` is set
    /// (i.e. when trading against the live broker rather than paper).
    ///
    /// # Errors
    /// Returns the first violated constraint.
    pub fn validate(&self, require_credentials: bool) -> Result<(), ConfigError> {
        if self.roots.is_empty() {
            return Err(ConfigError::MissingField { field: "roots" });
        }

        let mut seen = HashSet::new();
        for mapping in &self.roots {
            if mapping.strike_step == 0 {
                return Err(ConfigError::InvalidValue {
                    field: "roots.strike_step",
                    reason: format!("{} has a zero strike step", mapping.alert_symbol),
                });
            }
            if mapping.root.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "roots.root",
                    reason: format!("{} maps to an empty root", mapping.alert_symbol),
                });
            }
            if !seen.insert(mapping.alert_symbol.as_str()) {
                return Err(ConfigError::InvalidValue {
                    field: "roots.alert_symbol",
                    reason: format!("{} is mapped more than once", mapping.alert_symbol),
                });
            }
        }

        if self.router.instrument_ttl_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "router.instrument_ttl_secs",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.router.lots_per_entry == 0 {
            return Err(ConfigError::InvalidValue {
                field: "router.lots_per_entry",
                reason: "must be greater than zero".to_string(),
            });
        }

        let open = self.session.open_time()?;
        let close = self.session.close_time()?;
        if open >= close {
            return Err(ConfigError::InvalidValue {
                field: "session",
                reason: format!("open {open} is not before close {close}"),
            });
        }
        self.session.utc_offset()?;

        if require_credentials {
            if self.kite.api_key.trim().is_empty() {
                return Err(ConfigError::MissingField { field: "kite.api_key" });
            }
            if self.kite.access_token.trim().is_empty() {
                return Err(ConfigError::MissingField {
                    field: "kite.access_token",
                });
            }
        }

        Ok(())
    }
}

fn parse_hhmm(field: &'static str, value: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").map_err(|e| ConfigError::InvalidValue {
        field,
        reason: format!("{value:?}: {e}"),
    })
}
