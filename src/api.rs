use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Url;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::config::{NetworkConfig, ProviderConfig};
use crate::locations::Coordinates;

// ==================== Current Weather ====================

/// Response of the `/weather` endpoint, reduced to the fields we consume.
#[derive(Debug, Deserialize)]
pub struct CurrentWeatherResponse {
    pub main: MainReadings,
    pub weather: Vec<ConditionEntry>,
    pub clouds: Clouds,
    #[serde(default)]
    pub rain: Option<Rain>,
}

#[derive(Debug, Deserialize)]
pub struct MainReadings {
    pub temp: f64,
    #[serde(default)]
    pub humidity: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct ConditionEntry {
    pub main: String,
}

#[derive(Debug, Deserialize)]
pub struct Clouds {
    pub all: f64,
}

/// Rain accumulation; the provider omits windows with no data.
#[derive(Debug, Deserialize)]
pub struct Rain {
    #[serde(rename = "1h")]
    pub one_hour: Option<f64>,
    #[serde(rename = "3h")]
    pub three_hours: Option<f64>,
}

impl CurrentWeatherResponse {
    /// Primary condition label (`weather[0].main`).
    pub fn condition(&self) -> Result<&str> {
        self.weather
            .first()
            .map(|entry| entry.main.as_str())
            .context("Current weather response has no condition entry")
    }

    pub fn humidity(&self) -> Result<f64> {
        self.main
            .humidity
            .context("Current weather response has no humidity reading")
    }

    /// Precipitation in mm: the 3-hour accumulation if present, else 1-hour, else zero.
    pub fn precipitation(&self) -> f64 {
        self.rain
            .as_ref()
            .and_then(|rain| rain.three_hours.or(rain.one_hour))
            .unwrap_or(0.0)
    }
}

// ==================== Forecast ====================

/// Response of the 5 day / 3 hour `/forecast` endpoint.
#[derive(Debug, Deserialize)]
pub struct ForecastResponse {
    pub list: Vec<ForecastEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ForecastEntry {
    pub main: ForecastMain,
    /// Probability of precipitation, 0..1
    #[serde(default)]
    pub pop: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct ForecastMain {
    pub temp: f64,
}

// ==================== Air Pollution ====================

/// Response of `/air_pollution/history`.
#[derive(Debug, Deserialize)]
pub struct AirPollutionResponse {
    #[serde(default)]
    pub list: Vec<AirPollutionEntry>,
}

#[derive(Debug, Deserialize)]
pub struct AirPollutionEntry {
    pub main: AirQuality,
}

#[derive(Debug, Deserialize)]
pub struct AirQuality {
    /// 1 (good) .. 5 (very poor)
    pub aqi: u8,
}

impl AirPollutionResponse {
    /// Worst hourly index in the window, `None` when the provider returned no entries.
    pub fn max_aqi(&self) -> Option<u8> {
        self.list.iter().map(|entry| entry.main.aqi).max()
    }
}

// ==================== Client ====================

/// HTTP client for the OpenWeatherMap endpoints.
#[derive(Clone, Debug)]
pub struct OpenWeatherClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    units: String,
}

impl OpenWeatherClient {
    /// Create a new API client with configurable timeouts.
    pub fn new(provider: &ProviderConfig, network_config: &NetworkConfig) -> Result<Self> {
        if provider.api_key.trim().is_empty() {
            anyhow::bail!(
                "OPENWEATHER_API_KEY must be set (via .env file or environment variable)"
            );
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(network_config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(network_config.connect_timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: provider.base_url.trim_end_matches('/').to_string(),
            api_key: provider.api_key.clone(),
            units: provider.units.clone(),
        })
    }

    /// Fetch current conditions at a location.
    pub async fn current_weather(&self, at: Coordinates) -> Result<CurrentWeatherResponse> {
        let params = self.location_params(at, true);
        self.get_json("weather", &params).await
    }

    /// Fetch the 3-hourly forecast at a location.
    pub async fn forecast(&self, at: Coordinates) -> Result<ForecastResponse> {
        let params = self.location_params(at, true);
        self.get_json("forecast", &params).await
    }

    /// Fetch hourly air-quality history for `[start, end)` given as Unix seconds.
    pub async fn air_pollution_history(
        &self,
        at: Coordinates,
        start: i64,
        end: i64,
    ) -> Result<AirPollutionResponse> {
        let mut params = self.location_params(at, false);
        params.push(("start", start.to_string()));
        params.push(("end", end.to_string()));
        self.get_json("air_pollution/history", &params).await
    }

    fn location_params(&self, at: Coordinates, with_units: bool) -> Vec<(&'static str, String)> {
        let mut params = vec![("lat", at.lat.to_string()), ("lon", at.lon.to_string())];
        if with_units {
            params.push(("units", self.units.clone()));
        }
        params
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&'static str, String)],
    ) -> Result<T> {
        let url = format!("{}/{}", self.base_url, endpoint);
        tracing::debug!("GET {} {:?}", url, params);

        let url = Url::parse_with_params(
            &url,
            params
                .iter()
                .map(|(k, v)| (*k, v.as_str()))
                .chain(std::iter::once(("appid", self.api_key.as_str()))),
        )
        .with_context(|| format!("Invalid provider URL for {}", endpoint))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to send request to {} endpoint", endpoint))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("{} endpoint returned error status: {}", endpoint, status);
        }

        let data = response
            .json::<T>()
            .await
            .with_context(|| format!("Failed to parse {} response", endpoint))?;

        Ok(data)
    }
}
