use crate::config::AppConfig;
use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "config/Config.toml";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads application configuration by layering built-in defaults, the TOML
    /// file, `BRIDGE_*` variables (nested with `__`) and the broker credentials
    /// `KITE_API_KEY` / `KITE_ACCESS_TOKEN`.
    ///
    /// A missing file is not an error; every field has a default.
    ///
    /// # Errors
    ///
    /// Returns an error if the file or an environment variable cannot be parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<AppConfig> {
        Self::figment(path.as_ref(), None)
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.as_ref().display()))
    }

    /// Loads configuration with a profile overlay (`Config.{profile}.toml`
    /// next to the base file) applied before the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be read or parsed.
    pub fn load_with_profile(path: impl AsRef<Path>, profile: &str) -> Result<AppConfig> {
        Self::figment(path.as_ref(), Some(profile))
            .extract()
            .with_context(|| {
                format!(
                    "Failed to load config from {} with profile {profile}",
                    path.as_ref().display()
                )
            })
    }

    fn figment(path: &Path, profile: Option<&str>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path));

        if let Some(profile) = profile {
            figment = figment.merge(Toml::file(profile_path(path, profile)));
        }

        figment
            .merge(Env::prefixed("BRIDGE_").split("__"))
            .merge(
                Env::prefixed("KITE_")
                    .only(&["api_key", "access_token"])
                    .map(|key| format!("kite.{key}").into()),
            )
    }
}

fn profile_path(base: &Path, profile: &str) -> std::path::PathBuf {
    let stem = base
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Config");
    base.with_file_name(format!("{stem}.{profile}.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::Product;
    use figment::Jail;

    #[test]
    fn missing_file_yields_defaults() {
        Jail::expect_with(|_jail| {
            let config = ConfigLoader::load("config/Config.toml").map_err(|e| e.to_string())?;
            assert_eq!(config.router.instrument_ttl_secs, 300);
            assert_eq!(config.session.open, "09:15");
            assert_eq!(config.roots.len(), 2);
            Ok(())
        });
    }

    #[test]
    fn file_roots_replace_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "Config.toml",
                r#"
                [router]
                instrument_ttl_secs = 120
                dedup_horizon_secs = 86400

                [kite]
                product = "NRML"

                [[roots]]
                alert_symbol = "NSE:CNXFINANCE"
                root = "FINNIFTY"
                strike_step = 50
                "#,
            )?;
            let config = ConfigLoader::load("Config.toml").map_err(|e| e.to_string())?;
            assert_eq!(config.router.instrument_ttl_secs, 120);
            assert_eq!(config.router.dedup_horizon_secs, Some(86_400));
            assert_eq!(config.kite.product, Product::Nrml);
            assert_eq!(config.roots.len(), 1);
            assert_eq!(config.roots[0].root, "FINNIFTY");
            Ok(())
        });
    }

    #[test]
    fn environment_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("Config.toml", "[server]\nport = 9000\n")?;
            jail.set_env("BRIDGE_SERVER__PORT", "9100");
            jail.set_env("KITE_API_KEY", "key_abc");
            jail.set_env("KITE_ACCESS_TOKEN", "token_xyz");
            let config = ConfigLoader::load("Config.toml").map_err(|e| e.to_string())?;
            assert_eq!(config.server.port, 9100);
            assert_eq!(config.kite.api_key, "key_abc");
            assert_eq!(config.kite.access_token, "token_xyz");
            Ok(())
        });
    }

    #[test]
    fn profile_overlays_base_file() {
        Jail::expect_with(|jail| {
            jail.create_file("Config.toml", "[server]\nport = 9000\n")?;
            jail.create_file("Config.paper.toml", "[server]\nport = 9001\n")?;
            let config =
                ConfigLoader::load_with_profile("Config.toml", "paper").map_err(|e| e.to_string())?;
            assert_eq!(config.server.port, 9001);
            Ok(())
        });
    }
}
