//! Feature assembly for the traffic models
//!
//! Converts a weather snapshot and calendar context into the 19-value input
//! row the per-site regression models were trained on.

use thiserror::Error;

use crate::calendar::CalendarContext;
use crate::weather::WeatherSnapshot;

/// Errors raised while encoding categorical inputs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    /// The provider returned a condition label the models never saw.
    #[error("unknown weather condition label: {0:?}")]
    UnknownCondition(String),
}

/// Closed vocabulary of condition labels, in encoded order.
///
/// Codes follow sorted label order, matching the label encoder used at
/// training time.
pub const CONDITION_LABELS: [&str; 6] = [
    "Clear",
    "Clouds",
    "Overcast",
    "Partially Cloudy",
    "Rain, Overcast",
    "Rain, Partially Cloudy",
];

/// Encodes condition labels to integer codes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConditionEncoder;

impl ConditionEncoder {
    pub fn encode(&self, label: &str) -> Result<u32, EncodingError> {
        CONDITION_LABELS
            .iter()
            .position(|known| *known == label)
            .map(|idx| idx as u32)
            .ok_or_else(|| EncodingError::UnknownCondition(label.to_string()))
    }
}

/// Collapse the provider's 1-5 AQI into the 1-4 training buckets.
/// Unknown or missing values land in bucket 1.
pub fn aqi_bucket(aqi: Option<u8>) -> u8 {
    match aqi {
        Some(1) | Some(2) => 1,
        Some(3) => 2,
        Some(4) => 3,
        Some(5) => 4,
        _ => 1,
    }
}

/// Features for a single prediction, by name.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    pub temp_max: f64,
    pub temp_min: f64,
    pub temp: f64,
    pub humidity: f64,
    pub precip: f64,
    pub precip_probability: f64,
    pub cloud_cover: f64,
    pub uv_index: f64,
    pub condition_code: f64,
    pub year: f64,
    pub month: f64,
    pub day_of_week: f64,
    pub week_of_year: f64,
    pub is_weekend: f64,
    pub prev_day_rain: f64,
    pub prev_car_count: f64,
    pub rolling_rain_2: f64,
    pub is_holiday: f64,
    pub aqi_bucket: f64,
}

impl FeatureVector {
    /// Number of features
    pub const NUM_FEATURES: usize = 19;

    /// Column order the models were trained with. Changing it requires retraining.
    pub const NAMES: [&'static str; Self::NUM_FEATURES] = [
        "tempmax",
        "tempmin",
        "temp",
        "humidity",
        "precip",
        "precipcover",
        "cloudcover",
        "uvindex",
        "conditions_encoded",
        "year",
        "month",
        "dayofweek",
        "weekofyear",
        "is_weekend",
        "prev_day_rain",
        "prev_car_count",
        "rolling_rain_2",
        "is_holiday",
        "aqi_category",
    ];

    /// Convert features to the ordered row for the model
    pub fn to_vec(&self) -> Vec<f64> {
        self.to_array().to_vec()
    }

    pub fn to_array(&self) -> [f64; Self::NUM_FEATURES] {
        [
            self.temp_max,
            self.temp_min,
            self.temp,
            self.humidity,
            self.precip,
            self.precip_probability,
            self.cloud_cover,
            self.uv_index,
            self.condition_code,
            self.year,
            self.month,
            self.day_of_week,
            self.week_of_year,
            self.is_weekend,
            self.prev_day_rain,
            self.prev_car_count,
            self.rolling_rain_2,
            self.is_holiday,
            self.aqi_bucket,
        ]
    }

    /// Position of a named feature in the row.
    pub fn index_of(name: &str) -> Option<usize> {
        Self::NAMES.iter().position(|n| *n == name)
    }

    /// Name/value pairs for logging
    pub fn named(&self) -> Vec<(&'static str, f64)> {
        Self::NAMES.iter().copied().zip(self.to_array()).collect()
    }
}

/// Builds feature vectors from weather and calendar inputs.
#[derive(Debug, Clone)]
pub struct FeatureAssembler {
    encoder: ConditionEncoder,
    uv_index: f64,
}

impl FeatureAssembler {
    /// UV index fed to the models; the provider value is not fetched.
    pub const DEFAULT_UV_INDEX: f64 = 10.0;

    pub fn new(uv_index: f64) -> Self {
        Self {
            encoder: ConditionEncoder,
            uv_index,
        }
    }

    /// Assemble the row for one site-day.
    ///
    /// Previous-day rain and the 2-day rolling rain both reuse today's
    /// precipitation reading; no rain history is kept.
    pub fn assemble(
        &self,
        snapshot: &WeatherSnapshot,
        calendar: &CalendarContext,
        prev_car_count: u32,
    ) -> Result<FeatureVector, EncodingError> {
        let condition_code = self.encoder.encode(&snapshot.conditions)?;

        Ok(FeatureVector {
            temp_max: snapshot.temp_max,
            temp_min: snapshot.temp_min,
            temp: snapshot.temp,
            humidity: snapshot.humidity,
            precip: snapshot.precip,
            precip_probability: snapshot.precip_probability,
            cloud_cover: snapshot.cloud_cover,
            uv_index: self.uv_index,
            condition_code: condition_code as f64,
            year: calendar.year as f64,
            month: calendar.month as f64,
            day_of_week: calendar.day_of_week as f64,
            week_of_year: calendar.week_of_year as f64,
            is_weekend: flag(calendar.is_weekend),
            prev_day_rain: snapshot.precip,
            prev_car_count: prev_car_count as f64,
            rolling_rain_2: snapshot.precip,
            is_holiday: flag(calendar.is_holiday),
            aqi_bucket: aqi_bucket(snapshot.aqi) as f64,
        })
    }
}

impl Default for FeatureAssembler {
    fn default() -> Self {
        Self::new(Self::DEFAULT_UV_INDEX)
    }
}

fn flag(value: bool) -> f64 {
    if value { 1.0 } else { 0.0 }
}
