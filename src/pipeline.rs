//! One forecast run: weather → features → model → business targets.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::calendar::CalendarContext;
use crate::locations::{Site, normalize_name};
use crate::metrics::{self, Metrics, SiteProfile};
use crate::ml::{EncodingError, FeatureAssembler, FeatureVector, ModelError, TrafficModel};
use crate::traits::Clock;
use crate::weather::{WeatherClient, WeatherSnapshot};

/// Largest accepted previous-day vehicle count.
pub const MAX_PREV_CAR_COUNT: u32 = 3000;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("previous-day car count {0} is outside 0..=3000")]
    InvalidCarCount(i64),
    #[error("unknown location `{0}`")]
    UnknownLocation(String),
    #[error("no sales profile for {0}")]
    NoProfile(String),
    #[error("weather data is missing, prediction cannot proceed")]
    WeatherUnavailable,
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Check a user-supplied previous-day count.
pub fn validate_prev_count(value: i64) -> Result<u32, PipelineError> {
    u32::try_from(value)
        .ok()
        .filter(|v| *v <= MAX_PREV_CAR_COUNT)
        .ok_or(PipelineError::InvalidCarCount(value))
}

/// Result of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct Forecast {
    pub site: Site,
    #[serde(skip)]
    pub calendar: CalendarContext,
    pub snapshot: WeatherSnapshot,
    #[serde(skip)]
    pub features: FeatureVector,
    pub metrics: Metrics,
}

/// Runs the forecast for a site against an injected weather client and clock.
pub struct Forecaster {
    weather: WeatherClient,
    assembler: FeatureAssembler,
    clock: Arc<dyn Clock>,
    reference_year: i32,
}

impl Forecaster {
    pub fn new(
        weather: WeatherClient,
        assembler: FeatureAssembler,
        clock: Arc<dyn Clock>,
        reference_year: i32,
    ) -> Self {
        Self {
            weather,
            assembler,
            clock,
            reference_year,
        }
    }

    /// Resolve a name to a site that has a sales profile.
    pub fn resolve(&self, location_name: &str) -> Result<(Site, SiteProfile), PipelineError> {
        let site = self
            .weather
            .locations()
            .resolve(location_name)
            .cloned()
            .ok_or_else(|| PipelineError::UnknownLocation(normalize_name(location_name)))?;
        let profile =
            SiteProfile::for_site(&site.name).ok_or_else(|| PipelineError::NoProfile(site.name.clone()))?;
        Ok((site, profile))
    }

    /// Fetch weather only.
    pub async fn snapshot(&self, location_name: &str) -> Option<WeatherSnapshot> {
        self.weather.fetch(location_name).await
    }

    /// Full run for a resolved site.
    pub async fn run(
        &self,
        site: &Site,
        profile: SiteProfile,
        model: &TrafficModel,
        prev_car_count: u32,
    ) -> Result<Forecast, PipelineError> {
        let calendar = CalendarContext::today(self.clock.as_ref(), self.reference_year);
        tracing::info!("Forecasting {} for {:?}", site.name, calendar);

        let snapshot = self
            .weather
            .fetch_site(site)
            .await
            .ok_or(PipelineError::WeatherUnavailable)?;

        let features = self.assembler.assemble(&snapshot, &calendar, prev_car_count)?;
        let predicted = model.predict(&features)?;
        tracing::info!("Predicted {:.1} cars at {}", predicted, site.name);

        let metrics = metrics::derive(predicted, &calendar, profile);

        Ok(Forecast {
            site: site.clone(),
            calendar,
            snapshot,
            features,
            metrics,
        })
    }
}
