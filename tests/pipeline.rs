//! End-to-end forecast runs against a mocked provider and a model artifact on disk.

use std::path::Path;
use std::sync::Arc;

use carwash_forecast::{
    EncodingError, FeatureAssembler, FeatureVector, Forecaster, LocationTable, MockClock,
    MockNotifier, NoticeLevel, OpenWeatherClient, PipelineError, SiteProfile, TrafficModel,
    WeatherClient,
    config::{NetworkConfig, ProviderConfig},
    ml::{ModelArtifact, ModelSpec},
    report,
};
use chrono::{TimeZone, Utc};
use tempfile::tempdir;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

const FORECAST_BODY: &str = r#"{
    "list": [
        {"main": {"temp": 85.0}, "pop": 0.2},
        {"main": {"temp": 70.0}, "pop": 0.0}
    ]
}"#;

fn current_body(condition: &str) -> String {
    format!(
        r#"{{
            "main": {{"temp": 78.0, "humidity": 60}},
            "weather": [{{"main": "{}"}}],
            "clouds": {{"all": 40}}
        }}"#,
        condition
    )
}

async fn mount_provider(mock_server: &MockServer, condition: &str) {
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_string(current_body(condition)))
        .mount(mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_string(FORECAST_BODY))
        .mount(mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/air_pollution/history"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"list":[{"main":{"aqi":2}}]}"#))
        .mount(mock_server)
        .await;
}

/// Wednesday 2025-06-04, 08:00 in Florida.
fn forecaster(mock_server: &MockServer, notifier: &MockNotifier) -> Forecaster {
    let provider = ProviderConfig {
        base_url: mock_server.uri(),
        api_key: "test-key".to_string(),
        units: "imperial".to_string(),
    };
    let network = NetworkConfig {
        request_timeout_secs: 10,
        connect_timeout_secs: 5,
    };
    let clock = Arc::new(
        MockClock::new(Utc.with_ymd_and_hms(2025, 6, 4, 12, 0, 0).unwrap()).with_offset_hours(-4),
    );
    let api = OpenWeatherClient::new(&provider, &network).unwrap();
    let weather = WeatherClient::new(
        api,
        LocationTable::default(),
        8,
        clock.clone(),
        Arc::new(notifier.clone()),
    );
    Forecaster::new(weather, FeatureAssembler::default(), clock, 2025)
}

/// Linear model: 50 + 1.0 * prev_car_count.
fn write_model(dir: &Path, site: &str) -> TrafficModel {
    let mut coefficients = vec![0.0; FeatureVector::NUM_FEATURES];
    coefficients[FeatureVector::index_of("prev_car_count").unwrap()] = 1.0;
    let artifact = ModelArtifact::new(
        Some(site.to_string()),
        ModelSpec::Linear {
            intercept: 50.0,
            coefficients,
        },
    );

    let path = dir.join(format!("{}.json", site));
    artifact.save(&path).unwrap();
    TrafficModel::load(&path).unwrap()
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

// ==================== Successful Runs ====================

#[tokio::test]
async fn test_coral_springs_end_to_end() {
    let mock_server = MockServer::start().await;
    mount_provider(&mock_server, "Clear").await;
    let notifier = MockNotifier::new();
    let dir = tempdir().unwrap();

    let forecaster = forecaster(&mock_server, &notifier);
    let model = write_model(dir.path(), "Coral Springs");
    let (site, profile) = forecaster.resolve("coral springs").unwrap();
    assert_eq!(profile, SiteProfile::CoralSprings);

    let forecast = forecaster.run(&site, profile, &model, 150).await.unwrap();

    let m = &forecast.metrics;
    assert!(approx(m.predicted_count, 200.0));
    assert!(approx(m.members, 140.0));
    assert!(approx(m.conversion_goal, 14.0));
    assert!(approx(m.greeter_hourly_target, 1.4));
    assert_eq!(m.greeter_split.per_shift, 7.0);
    assert_eq!(m.greeter_split.supervisor, 0.0);
    assert_eq!(m.full_service, None);

    let features = forecast.features.to_vec();
    assert_eq!(features[0], 85.0); // tempmax
    assert_eq!(features[1], 70.0); // tempmin
    assert_eq!(features[2], 78.0); // temp
    assert_eq!(features[5], 20.0); // precipcover
    assert_eq!(features[8], 0.0); // Clear
    assert_eq!(features[9], 2025.0);
    assert_eq!(features[15], 150.0);
    assert_eq!(features[18], 1.0); // AQI 2 buckets to 1

    assert!(!notifier.was_called());
}

#[tokio::test]
async fn test_margate_end_to_end_report() {
    let mock_server = MockServer::start().await;
    mount_provider(&mock_server, "Clouds").await;
    let notifier = MockNotifier::new();
    let dir = tempdir().unwrap();

    let forecaster = forecaster(&mock_server, &notifier);
    let model = write_model(dir.path(), "Margate");
    let (site, profile) = forecaster.resolve("Margate").unwrap();

    let forecast = forecaster.run(&site, profile, &model, 250).await.unwrap();

    assert_eq!(forecast.calendar.day_of_week, 2);
    let m = &forecast.metrics;
    assert!(approx(m.predicted_count, 300.0));
    // Wednesday: no member bonus, weekday full-service rate
    assert!(approx(m.members, 75.0));
    assert!(approx(m.full_service.unwrap(), 22.5));
    assert_eq!(forecast.features.condition_code, 1.0);

    let text = report::render_forecast(&forecast);
    assert!(text.starts_with("Margate Predictions (Wednesday)"));
    assert!(text.contains("Predicted Car Count: 300 cars"));
    assert!(text.contains("Predicted Full Service washes:"));

    let json = serde_json::to_value(&forecast).unwrap();
    assert_eq!(json["site"]["name"], "Margate");
    assert_eq!(json["snapshot"]["aqi"], 2);
}

// ==================== Failure Modes ====================

#[tokio::test]
async fn test_unknown_condition_stops_prediction() {
    let mock_server = MockServer::start().await;
    mount_provider(&mock_server, "Snow").await;
    let notifier = MockNotifier::new();
    let dir = tempdir().unwrap();

    let forecaster = forecaster(&mock_server, &notifier);
    let model = write_model(dir.path(), "Margate");
    let (site, profile) = forecaster.resolve("Margate").unwrap();

    let err = forecaster.run(&site, profile, &model, 100).await.unwrap_err();
    match err {
        PipelineError::Encoding(EncodingError::UnknownCondition(label)) => assert_eq!(label, "Snow"),
        other => panic!("Expected unknown condition, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_weather_stops_prediction() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;
    let notifier = MockNotifier::new();
    let dir = tempdir().unwrap();

    let forecaster = forecaster(&mock_server, &notifier);
    let model = write_model(dir.path(), "Coral Springs");
    let (site, profile) = forecaster.resolve("Coral Springs").unwrap();

    let err = forecaster.run(&site, profile, &model, 100).await.unwrap_err();
    assert!(matches!(err, PipelineError::WeatherUnavailable));
    assert_eq!(notifier.count_level(NoticeLevel::Warning), 1);
}

#[tokio::test]
async fn test_resolve_rejects_unknown_and_unprofiled_sites() {
    let mock_server = MockServer::start().await;
    let notifier = MockNotifier::new();
    let forecaster = forecaster(&mock_server, &notifier);

    assert!(matches!(
        forecaster.resolve(" boca raton"),
        Err(PipelineError::UnknownLocation(name)) if name == "Boca Raton"
    ));
    assert!(matches!(
        forecaster.resolve("parkland"),
        Err(PipelineError::NoProfile(name)) if name == "Parkland"
    ));
}

#[tokio::test]
async fn test_negative_model_output_is_clamped() {
    let mock_server = MockServer::start().await;
    mount_provider(&mock_server, "Clear").await;
    let notifier = MockNotifier::new();
    let dir = tempdir().unwrap();

    let artifact = ModelArtifact::new(
        None,
        ModelSpec::Linear {
            intercept: -500.0,
            coefficients: vec![0.0; FeatureVector::NUM_FEATURES],
        },
    );
    let model_path = dir.path().join("negative.json");
    artifact.save(&model_path).unwrap();
    let model = TrafficModel::load(&model_path).unwrap();

    let forecaster = forecaster(&mock_server, &notifier);
    let (site, profile) = forecaster.resolve("Coral Springs").unwrap();
    let forecast = forecaster.run(&site, profile, &model, 0).await.unwrap();

    assert_eq!(forecast.metrics.predicted_count, 0.0);
    assert_eq!(forecast.metrics.members, 0.0);
}
