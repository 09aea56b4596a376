//! Core library for the weather station.
//!
//! This crate defines:
//! - A bounded HTTPS downloader and the OpenWeather endpoint URLs
//! - Geocoding of the configured city into coordinates
//! - Defensive mapping of One Call JSON into a fixed-size snapshot
//! - The shared snapshot cache and the background task that refreshes it
//! - Configuration & credentials handling
//!
//! It is used by `weather-station`, but a display front end only needs
//! [`WeatherCache`] and [`DisplayReader`].

pub mod cache;
pub mod config;
pub mod download;
pub mod endpoint;
pub mod error;
pub mod geocode;
pub mod model;
pub mod parser;
pub mod reader;
pub mod scheduler;
pub mod url_encode;

pub use cache::{ReadGuard, WeatherCache, WriteGuard};
pub use config::{Config, ServiceConfig};
pub use download::Downloader;
pub use endpoint::Endpoints;
pub use error::{DownloadError, FetchError, GeocodeError, LockTimeout};
pub use geocode::GeocodingResolver;
pub use model::{
    AtmosphericForecast, Coordinates, CurrentWeather, DailyForecast, HourlyForecast,
    MinutelyForecast, PrecipitationIntensity, TemperatureForecast, WeatherCondition,
    WeatherSnapshot, WindForecast,
};
pub use reader::{DisplayReader, RefreshOutcome};
pub use scheduler::{FetchScheduler, SchedulerConfig, SchedulerState};
