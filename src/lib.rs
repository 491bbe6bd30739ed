//! Car Wash Forecast Library
//!
//! This module exposes the core components of the traffic forecaster
//! for testing and potential reuse.

pub mod api;
pub mod calendar;
pub mod config;
pub mod locations;
pub mod metrics;
pub mod ml;
pub mod pipeline;
pub mod report;
pub mod traits;
pub mod weather;

// Re-export commonly used types
pub use api::OpenWeatherClient;
pub use calendar::{CalendarContext, is_us_holiday, weekday_name};
pub use config::AppConfig;
pub use locations::{Coordinates, LocationTable, Site};
pub use metrics::{GreeterSplit, Metrics, SiteProfile, derive};
pub use ml::{
    ConditionEncoder, EncodingError, FeatureAssembler, FeatureVector, ModelArtifact, ModelError,
    TrafficModel, aqi_bucket,
};
pub use pipeline::{Forecast, Forecaster, PipelineError, validate_prev_count};
pub use traits::{Clock, ConsoleNotifier, MockClock, MockNotifier, NoticeLevel, Notifier, SystemClock};
pub use weather::{WeatherClient, WeatherSnapshot};
