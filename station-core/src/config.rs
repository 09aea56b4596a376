use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::endpoint::DEFAULT_BASE_URL;

pub const API_KEY_ENV: &str = "WEATHER_STATION_API_KEY";
pub const CITY_ENV: &str = "WEATHER_STATION_CITY";

/// Tuning for the fetch service. Every field has a default, so a config file
/// only needs the ones it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub base_url: String,
    pub update_interval_secs: u64,
    pub bootstrap_retry_delay_secs: u64,
    pub bootstrap_max_attempts: u32,
    pub write_lock_timeout_ms: u64,
    pub read_lock_timeout_ms: u64,
    pub http_timeout_secs: u64,
    pub response_buffer_bytes: usize,
    pub geocode_buffer_bytes: usize,
    pub https_only: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            update_interval_secs: 10 * 60,
            bootstrap_retry_delay_secs: 10,
            bootstrap_max_attempts: 5,
            write_lock_timeout_ms: 5000,
            read_lock_timeout_ms: 100,
            http_timeout_secs: 30,
            response_buffer_bytes: 64 * 1024,
            geocode_buffer_bytes: 4 * 1024,
            https_only: true,
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// city = "São Paulo"
///
/// [service]
/// update_interval_secs = 600
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub api_key: Option<String>,
    pub city: Option<String>,

    #[serde(default)]
    pub service: ServiceConfig,
}

impl Config {
    /// Load config from disk (or defaults if it doesn't exist yet), then apply
    /// environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        let mut cfg = Self::load_from(&path)?;
        cfg.apply_env_overrides(|name| std::env::var(name).ok());
        Ok(cfg)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-station", "weather-station")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Non-empty values from `lookup` replace the stored API key and city.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup(API_KEY_ENV).filter(|v| !v.trim().is_empty()) {
            self.api_key = Some(key);
        }
        if let Some(city) = lookup(CITY_ENV).filter(|v| !v.trim().is_empty()) {
            self.city = Some(city);
        }
    }

    pub fn set_credentials(&mut self, api_key: String, city: String) {
        self.api_key = Some(api_key.trim().to_string());
        self.city = Some(city.trim().to_string());
    }

    pub fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                anyhow!(
                    "No OpenWeather API key configured.\n\
                     Hint: run `weather-station configure` or set {API_KEY_ENV}."
                )
            })
    }

    pub fn city(&self) -> Result<&str> {
        self.city.as_deref().filter(|c| !c.is_empty()).ok_or_else(|| {
            anyhow!(
                "No city configured.\n\
                 Hint: run `weather-station configure` or set {CITY_ENV}."
            )
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key().is_ok() && self.city().is_ok()
    }
}
