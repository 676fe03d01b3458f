//! Application configuration.
//!
//! Values are layered: built-in defaults, then `config.json` under the user's
//! config directory, then `BURNRATE__*` environment variables (nested keys use
//! `__`, e.g. `BURNRATE__MARKET__HEAT_DECAY`).

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{market::MarketTuning, save::SaveManager};

/// Directory under the platform config root holding our files.
pub const CONFIG_DIR: &str = "burnrate";
/// File name of the user configuration.
pub const CONFIG_FILE: &str = "config.json";
const ENV_PREFIX: &str = "BURNRATE";

/// Runtime settings for a game host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Galaxy definition file.
    pub universe_path: PathBuf,
    /// Directory holding save slots.
    pub save_root: PathBuf,
    /// Seconds between market replenishment cycles.
    pub market_interval_secs: u64,
    /// The only planet where modules are sold.
    pub upgrade_planet: String,
    /// Where new ships spawn.
    pub start_planet: String,
    /// Template used for the starter ship when none is requested.
    pub starter_template: String,
    /// Fixed seed for reproducible sessions; random when unset.
    pub rng_seed: Option<u64>,
    /// Economy balance knobs.
    pub market: MarketTuning,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            universe_path: PathBuf::from("universe.yaml"),
            save_root: SaveManager::default_root(),
            market_interval_secs: 30,
            upgrade_planet: "planet_prime".to_string(),
            start_planet: "planet_prime".to_string(),
            starter_template: "ship_hauler".to_string(),
            rng_seed: None,
            market: MarketTuning::default(),
        }
    }
}

impl AppConfig {
    /// Directory holding the configuration file.
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_DIR)
    }

    /// Default location of the configuration file.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join(CONFIG_FILE)
    }

    /// Load configuration from the default location.
    pub fn load() -> Result<Self> {
        Self::load_from(Self::config_path())
    }

    /// Load configuration from `path` (optional) plus environment overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let settings = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("failed to read config {}", path.display()))?;
        settings
            .try_deserialize()
            .with_context(|| format!("invalid config {}", path.display()))
    }

    /// Period of the market replenishment task.
    pub fn market_interval(&self) -> Duration {
        Duration::from_secs(self.market_interval_secs.max(1))
    }
}

/// Write the default configuration unless a file already exists.
pub fn ensure_default_config() -> Result<PathBuf> {
    ensure_default_config_at(AppConfig::config_path())
}

/// Write the default configuration to `path` unless it already exists.
pub fn ensure_default_config_at(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    if path.exists() {
        return Ok(path.to_path_buf());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let serialized = serde_json::to_string_pretty(&AppConfig::default())
        .context("failed to serialize default config")?;
    fs::write(path, serialized).with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "Wrote default config");
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() -> Result<()> {
        let dir = tempdir()?;
        let config = AppConfig::load_from(dir.path().join("absent.json"))?;
        assert_eq!(config.upgrade_planet, "planet_prime");
        assert_eq!(config.market.min_board_size, 4);
        Ok(())
    }

    #[test]
    fn default_file_round_trips() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join(CONFIG_FILE);
        ensure_default_config_at(&path)?;
        assert!(path.exists());

        let loaded = AppConfig::load_from(&path)?;
        assert_eq!(loaded.market_interval_secs, 30);
        assert_eq!(loaded.starter_template, "ship_hauler");
        assert_eq!(loaded.rng_seed, None);
        Ok(())
    }

    #[test]
    fn partial_file_overrides_selected_fields() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(CONFIG_FILE);
        fs::write(
            &path,
            r#"{ "market_interval_secs": 5, "rng_seed": 99, "market": { "min_board_size": 2 } }"#,
        )?;

        let config = AppConfig::load_from(&path)?;
        assert_eq!(config.market_interval(), Duration::from_secs(5));
        assert_eq!(config.rng_seed, Some(99));
        assert_eq!(config.market.min_board_size, 2);
        assert_eq!(config.market.max_board_size, 10);
        assert_eq!(config.start_planet, "planet_prime");
        Ok(())
    }

    #[test]
    fn existing_file_is_not_overwritten() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, r#"{ "upgrade_planet": "planet_ferrum" }"#)?;
        ensure_default_config_at(&path)?;
        assert_eq!(AppConfig::load_from(&path)?.upgrade_planet, "planet_ferrum");
        Ok(())
    }
}
