use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::model::{Coordinates, TemperatureUnit};

pub const DEFAULT_ITEMS_BASE_URL: &str = "http://localhost:3001";

/// Location used whenever the device position cannot be obtained.
pub const FALLBACK_COORDINATES: Coordinates = Coordinates::new(40.7128, -74.0060);

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// items_base_url = "http://localhost:3001"
/// temperature_unit = "F"
///
/// [fallback]
/// latitude = 40.7128
/// longitude = -74.006
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Weather lookup API key.
    pub api_key: Option<String>,

    /// Base URL of the item-storage REST service.
    pub items_base_url: String,

    pub temperature_unit: TemperatureUnit,

    /// Location used when the device position is unavailable.
    pub fallback: Coordinates,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            items_base_url: DEFAULT_ITEMS_BASE_URL.to_string(),
            temperature_unit: TemperatureUnit::default(),
            fallback: FALLBACK_COORDINATES,
        }
    }
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "wardrobe", "wardrobe-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Returns the weather API key, if present and non-blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|key| !key.trim().is_empty())
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    pub fn is_configured(&self) -> bool {
        self.api_key().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_uses_local_items_service_and_fallback() {
        let cfg = Config::default();

        assert_eq!(cfg.items_base_url, "http://localhost:3001");
        assert_eq!(cfg.fallback, FALLBACK_COORDINATES);
        assert_eq!(cfg.temperature_unit, TemperatureUnit::Fahrenheit);
        assert!(!cfg.is_configured());
    }

    #[test]
    fn blank_api_key_is_not_configured() {
        let mut cfg = Config::default();
        cfg.set_api_key("   ".into());
        assert!(!cfg.is_configured());

        cfg.set_api_key("KEY".into());
        assert_eq!(cfg.api_key(), Some("KEY"));
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let cfg = Config::from_toml(
            r#"
            api_key = "abc"
            temperature_unit = "C"
            "#,
        )
        .expect("partial config must parse");

        assert_eq!(cfg.api_key(), Some("abc"));
        assert_eq!(cfg.temperature_unit, TemperatureUnit::Celsius);
        assert_eq!(cfg.items_base_url, DEFAULT_ITEMS_BASE_URL);
    }

    #[test]
    fn toml_roundtrip_keeps_fallback() {
        let mut cfg = Config::default();
        cfg.fallback = Coordinates::new(51.5, -0.12);

        let text = toml::to_string_pretty(&cfg).unwrap();
        let parsed = Config::from_toml(&text).unwrap();
        assert_eq!(parsed.fallback, cfg.fallback);
    }
}
