use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub provider: ProviderConfig,
    pub network: NetworkConfig,
    pub model: ModelConfig,
    /// Model artifact file name per site, keyed by the normalized site name.
    #[serde(default)]
    pub sites: HashMap<String, SiteConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
    pub api_key: String,
    pub units: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NetworkConfig {
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    /// Year fed to the model instead of the real one; the last year present in training data.
    pub reference_year: i32,
    /// Placeholder UV index, the provider value is not fetched.
    pub uv_index: f64,
    /// Number of 3-hour forecast entries considered (8 = next 24 hours).
    pub forecast_window: usize,
    pub models_dir: PathBuf,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            reference_year: 2025,
            uv_index: 10.0,
            forecast_window: 8,
            models_dir: PathBuf::from("models"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SiteConfig {
    pub model_file: String,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        // Load .env file (silently ignore if not present - production uses env vars directly)
        let _ = dotenvy::dotenv();

        // The provider key is checked when the API client is built, so commands
        // that never call the provider work without it
        let api_key = std::env::var("OPENWEATHER_API_KEY").unwrap_or_default();

        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("carwash-forecast");

        let builder = Config::builder()
            // 1. Load default values
            // Provider
            .set_default("provider.base_url", "https://api.openweathermap.org/data/2.5")?
            .set_default("provider.api_key", api_key)?
            .set_default("provider.units", "imperial")?
            // Network
            .set_default("network.request_timeout_secs", 30)?
            .set_default("network.connect_timeout_secs", 10)?
            // Model
            .set_default("model.reference_year", 2025)?
            .set_default("model.uv_index", 10.0)?
            .set_default("model.forecast_window", 8)?
            .set_default("model.models_dir", "models")?
            // Sites
            .set_default("sites.coral_springs.model_file", "xgb_CORALSPRINGS_model.json")?
            .set_default("sites.margate.model_file", "xgb_MARGATE_model.json")?

            // 2. Load from local config file (optional, lowest priority)
            .add_source(File::from(PathBuf::from("config.toml")).required(false))

            // 3. Load from user config directory (optional, overrides local)
            .add_source(File::from(config_dir.join("config.toml")).required(false))

            // 4. Load from Environment variables (CARWASH__NETWORK__REQUEST_TIMEOUT_SECS=...)
            .add_source(Environment::with_prefix("CARWASH").separator("__"));

        let s = builder.build()?;
        Ok(s.try_deserialize()?)
    }

    /// Full path of the model artifact configured for a site, if any.
    pub fn model_path(&self, site_key: &str) -> Option<PathBuf> {
        self.sites
            .get(site_key)
            .map(|site| self.model.models_dir.join(&site.model_file))
    }
}
