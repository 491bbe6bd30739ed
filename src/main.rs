use std::sync::Arc;

use anyhow::{Context, Result};
use carwash_forecast::{
    AppConfig, ConsoleNotifier, FeatureAssembler, Forecaster, LocationTable, OpenWeatherClient,
    SiteProfile, SystemClock, TrafficModel, WeatherClient, report, validate_prev_count,
};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(name = "carwash-forecast")]
#[command(about = "Daily car wash traffic forecast from weather and yesterday's count")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Predict today's car count and staffing targets for a site
    Predict {
        /// Site name, e.g. "Margate"
        #[arg(long)]
        location: String,
        /// Total car count from yesterday (0-3000)
        #[arg(long, allow_negative_numbers = true)]
        prev_count: i64,
        /// Print the forecast as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Show the weather snapshot for a site
    Weather {
        #[arg(long)]
        location: String,
    },
    /// List known sites and their model files
    Sites,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::builder()
        .with_default_directive(tracing::level_filters::LevelFilter::INFO.into())
        .parse_lossy("carwash_forecast=debug");

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    if let Command::Sites = args.command {
        return list_sites(&config);
    }

    let rt = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
    let forecaster = build_forecaster(&config)?;

    match args.command {
        Command::Predict {
            location,
            prev_count,
            json,
        } => rt.block_on(run_predict(&config, &forecaster, &location, prev_count, json)),
        Command::Weather { location } => rt.block_on(async {
            let snapshot = forecaster
                .snapshot(&location)
                .await
                .context("Could not retrieve weather data")?;
            print!("{}", report::render_snapshot(&snapshot));
            Ok::<_, anyhow::Error>(())
        }),
        Command::Sites => Ok(()),
    }
}

fn build_forecaster(config: &AppConfig) -> Result<Forecaster> {
    let clock = Arc::new(SystemClock);
    let notifier = Arc::new(ConsoleNotifier);

    let api = OpenWeatherClient::new(&config.provider, &config.network)?;
    tracing::info!("API client initialized");

    let weather = WeatherClient::new(
        api,
        LocationTable::default(),
        config.model.forecast_window,
        clock.clone(),
        notifier,
    );

    Ok(Forecaster::new(
        weather,
        FeatureAssembler::new(config.model.uv_index),
        clock,
        config.model.reference_year,
    ))
}

/// Validate inputs, load the site's model, run the pipeline and print the result
async fn run_predict(
    config: &AppConfig,
    forecaster: &Forecaster,
    location: &str,
    prev_count: i64,
    json: bool,
) -> Result<()> {
    let prev_count = validate_prev_count(prev_count)?;
    let (site, profile) = forecaster.resolve(location)?;

    let model_path = config
        .model_path(&site.config_key())
        .with_context(|| format!("No model file configured for {}", site.name))?;
    let model = TrafficModel::load(&model_path)
        .with_context(|| format!("Failed to load model for {}", site.name))?;
    tracing::info!("Using {}", model.description());

    let forecast = forecaster.run(&site, profile, &model, prev_count).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&forecast)?);
    } else {
        print!("{}", report::render_forecast(&forecast));
    }
    Ok(())
}

fn list_sites(config: &AppConfig) -> Result<()> {
    for site in LocationTable::default().sites() {
        let profile = SiteProfile::for_site(&site.name)
            .map(|p| format!("{:?}", p))
            .unwrap_or_else(|| "no profile".to_string());
        let model = config
            .model_path(&site.config_key())
            .map(|p| {
                let state = if p.exists() { "" } else { " (missing)" };
                format!("{}{}", p.display(), state)
            })
            .unwrap_or_else(|| "no model".to_string());
        println!(
            "{:<14} {:>9.4} {:>9.4}  {:<12} {}",
            site.name, site.coordinates.lat, site.coordinates.lon, profile, model
        );
    }
    Ok(())
}
