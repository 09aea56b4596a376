use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Text};
use station_core::{
    Config, DisplayReader, Downloader, Endpoints, FetchScheduler, GeocodingResolver,
    RefreshOutcome, WeatherCache,
};
use tracing::info;

use crate::display;

const DEFAULT_CITY: &str = "São Paulo";
const DISPLAY_REFRESH: Duration = Duration::from_secs(1);

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "weather-station",
    version,
    about = "OpenWeather forecast service for a weather station display"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key and the station's city.
    Configure,

    /// Keep the forecast fresh in the background and print updates.
    Run,

    /// Fetch the forecast once and print it.
    Show {
        /// City to use instead of the configured one.
        #[arg(long)]
        city: Option<String>,
    },

    /// Resolve a city name into coordinates.
    Geocode {
        /// City name; defaults to the configured one.
        city: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Run => run_service().await,
            Command::Show { city } => show(city).await,
            Command::Geocode { city } => geocode(city).await,
        }
    }
}

fn configure() -> Result<()> {
    let path = Config::config_file_path()?;
    let mut config = Config::load_from(&path)?;

    let api_key = Password::new("OpenWeather API key:")
        .without_confirmation()
        .with_display_mode(PasswordDisplayMode::Masked)
        .prompt()
        .context("Failed to read API key")?;

    let default_city = config.city.clone().unwrap_or_else(|| DEFAULT_CITY.to_string());
    let city = Text::new("City:")
        .with_default(&default_city)
        .prompt()
        .context("Failed to read city")?;

    config.set_credentials(api_key, city);
    config.api_key()?;
    config.city()?;
    config.save_to(&path)?;

    println!("Configuration saved to {}", path.display());
    Ok(())
}

fn load_config(city: Option<String>) -> Result<Config> {
    let mut config = Config::load()?;
    if let Some(city) = city {
        config.city = Some(city);
    }
    Ok(config)
}

fn read_timeout(config: &Config) -> Duration {
    Duration::from_millis(config.service.read_lock_timeout_ms)
}

async fn run_service() -> Result<()> {
    let config = load_config(None)?;
    let cache = Arc::new(WeatherCache::new());
    let scheduler = FetchScheduler::from_config(Arc::clone(&cache), &config)?;

    let mut state = scheduler.subscribe();
    let mut task = scheduler.spawn();
    let mut reader = DisplayReader::new(cache, read_timeout(&config));
    let mut refresh = tokio::time::interval(DISPLAY_REFRESH);

    info!(city = config.city()?, "weather service started");

    loop {
        tokio::select! {
            _ = refresh.tick() => {
                if reader.refresh().await == RefreshOutcome::Updated {
                    println!("{}", display::summary_line(reader.coordinates(), reader.current()));
                    println!("{}", display::precipitation_strip(reader.scaled_minutely_precipitation()));
                }
            }
            Ok(()) = state.changed() => {
                let current = *state.borrow_and_update();
                info!(state = ?current, "weather service state changed");
            }
            finished = &mut task => {
                let stopped = finished.context("Weather service task failed")?;
                bail!("Weather service stopped ({stopped:?}): could not resolve the configured city");
            }
            _ = tokio::signal::ctrl_c() => {
                task.abort();
                info!("shutting down");
                return Ok(());
            }
        }
    }
}

async fn show(city: Option<String>) -> Result<()> {
    let config = load_config(city)?;
    let cache = Arc::new(WeatherCache::new());
    let scheduler = FetchScheduler::from_config(Arc::clone(&cache), &config)?;

    let coord = scheduler
        .bootstrap()
        .await
        .ok_or_else(|| anyhow!("Could not resolve coordinates for {:?}", config.city))?;

    scheduler
        .fetch_cycle(&coord)
        .await
        .context("Failed to fetch weather data")?;

    let snapshot = cache.snapshot(read_timeout(&config)).await?;
    println!("{}", display::render_snapshot(&snapshot));
    Ok(())
}

async fn geocode(city: Option<String>) -> Result<()> {
    let config = load_config(city)?;
    let service = &config.service;
    let city = config.city()?;

    let downloader = Downloader::new(
        Duration::from_secs(service.http_timeout_secs),
        service.https_only,
    )?;
    let resolver = GeocodingResolver::with_buffer_size(
        downloader,
        Endpoints::new(&service.base_url),
        service.geocode_buffer_bytes,
    );

    let coord = resolver
        .try_resolve(city, config.api_key()?)
        .await
        .with_context(|| format!("Failed to resolve {city:?}"))?;

    println!(
        "{city}: lat {:.6}, lon {:.6}, timezone {} (UTC offset {:+}s)",
        coord.latitude, coord.longitude, coord.timezone, coord.timezone_offset
    );
    Ok(())
}
