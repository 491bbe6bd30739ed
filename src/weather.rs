//! Weather snapshot assembly from the provider's three endpoints.
//!
//! Current conditions and the forecast are both required: a failure in either
//! aborts the snapshot. Air quality is optional and degrades to `None`.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::Serialize;

use crate::api::{CurrentWeatherResponse, ForecastResponse, OpenWeatherClient};
use crate::locations::{LocationTable, Site, normalize_name};
use crate::traits::{Clock, Notifier};

/// Normalized weather readings for one site.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherSnapshot {
    /// Current temperature (°F)
    pub temp: f64,
    /// Forecast high over the window (°F)
    pub temp_max: f64,
    /// Forecast low over the window (°F)
    pub temp_min: f64,
    /// Forecast mean over the window (°F), informational only
    pub avg_temp: f64,
    /// Relative humidity (%)
    pub humidity: f64,
    /// Cloud cover (%)
    pub cloud_cover: f64,
    /// Recent rain accumulation (mm)
    pub precip: f64,
    /// Highest chance of rain in the window (%)
    pub precip_probability: f64,
    /// Provider condition label, e.g. "Clear"
    pub conditions: String,
    /// Worst air-quality index (1-5) over the previous UTC day
    pub aqi: Option<u8>,
}

/// Readings taken from the current-conditions endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentConditions {
    pub temp: f64,
    pub humidity: f64,
    pub cloud_cover: f64,
    pub conditions: String,
    pub precip: f64,
}

impl TryFrom<&CurrentWeatherResponse> for CurrentConditions {
    type Error = anyhow::Error;

    fn try_from(response: &CurrentWeatherResponse) -> Result<Self> {
        Ok(Self {
            temp: response.main.temp,
            humidity: response.humidity()?,
            cloud_cover: response.clouds.all,
            conditions: response.condition()?.to_string(),
            precip: response.precipitation(),
        })
    }
}

/// Aggregates over the leading forecast entries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastSummary {
    pub temp_max: f64,
    pub temp_min: f64,
    pub avg_temp: f64,
    pub precip_probability: f64,
}

impl ForecastSummary {
    /// Summarize the first `window` entries; an empty window is an error.
    pub fn from_response(response: &ForecastResponse, window: usize) -> Result<Self> {
        let entries: Vec<_> = response.list.iter().take(window).collect();
        if entries.is_empty() {
            anyhow::bail!("Forecast response contained no entries");
        }

        let temps: Vec<f64> = entries.iter().map(|e| e.main.temp).collect();
        let temp_max = temps.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let temp_min = temps.iter().copied().fold(f64::INFINITY, f64::min);
        let avg_temp = temps.iter().sum::<f64>() / temps.len() as f64;
        let max_pop = entries
            .iter()
            .map(|e| e.pop.unwrap_or(0.0))
            .fold(f64::NEG_INFINITY, f64::max);

        Ok(Self {
            temp_max,
            temp_min,
            avg_temp,
            precip_probability: max_pop * 100.0,
        })
    }
}

/// Unix-second bounds `[start, end)` of the UTC day before `now`.
pub fn previous_utc_day(now: DateTime<Utc>) -> (i64, i64) {
    let yesterday = (now - Duration::days(1)).date_naive();
    let start = yesterday.and_time(NaiveTime::MIN).and_utc().timestamp();
    (start, start + 86_400)
}

/// Fetches and normalizes weather for named sites.
pub struct WeatherClient {
    api: OpenWeatherClient,
    locations: LocationTable,
    forecast_window: usize,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
}

impl WeatherClient {
    pub fn new(
        api: OpenWeatherClient,
        locations: LocationTable,
        forecast_window: usize,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            api,
            locations,
            forecast_window,
            clock,
            notifier,
        }
    }

    pub fn locations(&self) -> &LocationTable {
        &self.locations
    }

    /// Fetch a snapshot for a site name.
    ///
    /// Returns `None` after notifying when the name is unknown or when current
    /// conditions or the forecast cannot be retrieved.
    pub async fn fetch(&self, location_name: &str) -> Option<WeatherSnapshot> {
        let Some(site) = self.locations.resolve(location_name) else {
            self.notifier
                .error(&format!("Error with location: `{}`", normalize_name(location_name)));
            return None;
        };
        self.fetch_site(site).await
    }

    /// Fetch a snapshot for an already resolved site.
    pub async fn fetch_site(&self, site: &Site) -> Option<WeatherSnapshot> {
        tracing::info!("Fetching weather for {}", site.name);

        // 1. Current conditions
        let current = match self.fetch_current(site).await {
            Ok(current) => current,
            Err(e) => {
                self.notifier
                    .warn(&format!("Failed to fetch current weather: {:#}", e));
                return None;
            }
        };

        // 2. Forecast (high/low and chance of rain)
        let forecast = match self.fetch_forecast(site).await {
            Ok(forecast) => forecast,
            Err(e) => {
                self.notifier
                    .warn(&format!("Failed to fetch forecast data: {:#}", e));
                return None;
            }
        };

        // 3. Air quality, optional
        let aqi = match self.fetch_aqi(site).await {
            Ok(aqi) => aqi,
            Err(e) => {
                self.notifier
                    .warn(&format!("Failed to fetch historical AQI data: {:#}", e));
                None
            }
        };

        let snapshot = WeatherSnapshot {
            temp: current.temp,
            temp_max: forecast.temp_max,
            temp_min: forecast.temp_min,
            avg_temp: forecast.avg_temp,
            humidity: current.humidity,
            cloud_cover: current.cloud_cover,
            precip: current.precip,
            precip_probability: forecast.precip_probability,
            conditions: current.conditions,
            aqi,
        };
        tracing::debug!("Weather snapshot for {}: {:?}", site.name, snapshot);
        Some(snapshot)
    }

    async fn fetch_current(&self, site: &Site) -> Result<CurrentConditions> {
        let response = self.api.current_weather(site.coordinates).await?;
        CurrentConditions::try_from(&response)
    }

    async fn fetch_forecast(&self, site: &Site) -> Result<ForecastSummary> {
        let response = self.api.forecast(site.coordinates).await?;
        ForecastSummary::from_response(&response, self.forecast_window)
    }

    async fn fetch_aqi(&self, site: &Site) -> Result<Option<u8>> {
        let (start, end) = previous_utc_day(self.clock.now_utc());
        let response = self
            .api
            .air_pollution_history(site.coordinates, start, end)
            .await
            .context("Air pollution request failed")?;
        Ok(response.max_aqi())
    }
}
