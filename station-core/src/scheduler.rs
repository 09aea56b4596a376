//! Background task that keeps the [`WeatherCache`] fresh.
//!
//! The task starts in [`SchedulerState::Bootstrapping`], resolving the
//! configured city into coordinates with a bounded number of attempts. It then
//! runs fetch cycles forever in [`SchedulerState::Running`]. Running out of
//! bootstrap attempts moves it to [`SchedulerState::Terminated`] and ends the
//! task; nothing else in the process is affected.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::cache::WeatherCache;
use crate::config::{Config, ServiceConfig};
use crate::download::{Downloader, scratch_buffer};
use crate::endpoint::Endpoints;
use crate::error::{FetchError, LockTimeout};
use crate::geocode::GeocodingResolver;
use crate::model::Coordinates;
use crate::parser;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Bootstrapping,
    Running,
    Terminated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub update_interval: Duration,
    pub bootstrap_retry_delay: Duration,
    pub bootstrap_max_attempts: u32,
    pub write_lock_timeout: Duration,
    pub response_buffer_size: usize,
    pub geocode_buffer_size: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::from(&ServiceConfig::default())
    }
}

impl From<&ServiceConfig> for SchedulerConfig {
    fn from(service: &ServiceConfig) -> Self {
        Self {
            update_interval: Duration::from_secs(service.update_interval_secs),
            bootstrap_retry_delay: Duration::from_secs(service.bootstrap_retry_delay_secs),
            bootstrap_max_attempts: service.bootstrap_max_attempts.max(1),
            write_lock_timeout: Duration::from_millis(service.write_lock_timeout_ms),
            response_buffer_size: service.response_buffer_bytes,
            geocode_buffer_size: service.geocode_buffer_bytes,
        }
    }
}

#[derive(Debug)]
pub struct FetchScheduler {
    cache: Arc<WeatherCache>,
    downloader: Downloader,
    resolver: GeocodingResolver,
    endpoints: Endpoints,
    api_key: String,
    city: String,
    config: SchedulerConfig,
    state: watch::Sender<SchedulerState>,
}

impl FetchScheduler {
    pub fn new(
        cache: Arc<WeatherCache>,
        downloader: Downloader,
        endpoints: Endpoints,
        api_key: String,
        city: String,
        config: SchedulerConfig,
    ) -> Self {
        let resolver = GeocodingResolver::with_buffer_size(
            downloader.clone(),
            endpoints.clone(),
            config.geocode_buffer_size,
        );
        let (state, _) = watch::channel(SchedulerState::Bootstrapping);

        Self {
            cache,
            downloader,
            resolver,
            endpoints,
            api_key,
            city,
            config,
            state,
        }
    }

    /// Build a scheduler from the stored configuration. Fails if the API key
    /// or city is missing.
    pub fn from_config(cache: Arc<WeatherCache>, config: &Config) -> anyhow::Result<Self> {
        let service = &config.service;
        let downloader = Downloader::new(
            Duration::from_secs(service.http_timeout_secs),
            service.https_only,
        )?;

        Ok(Self::new(
            cache,
            downloader,
            Endpoints::new(&service.base_url),
            config.api_key()?.to_string(),
            config.city()?.to_string(),
            SchedulerConfig::from(service),
        ))
    }

    pub fn state(&self) -> SchedulerState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SchedulerState> {
        self.state.subscribe()
    }

    pub fn spawn(self) -> JoinHandle<SchedulerState> {
        tokio::spawn(self.run())
    }

    /// Bootstrap, then fetch every `update_interval`. Only returns when
    /// bootstrapping fails.
    pub async fn run(self) -> SchedulerState {
        let Some(coord) = self.bootstrap().await else {
            error!(city = %self.city, "invalid coordinates, stopping weather service task");
            self.state.send_replace(SchedulerState::Terminated);
            return SchedulerState::Terminated;
        };

        self.state.send_replace(SchedulerState::Running);

        loop {
            match self.fetch_cycle(&coord).await {
                Ok(()) => {}
                Err(e @ FetchError::LockTimeout(_)) => warn!(error = %e, "skipping weather update"),
                Err(e) => error!(error = %e, "failed to update weather data"),
            }
            tokio::time::sleep(self.config.update_interval).await;
        }
    }

    /// Resolve the configured city, retrying up to `bootstrap_max_attempts`
    /// times in total.
    pub async fn bootstrap(&self) -> Option<Coordinates> {
        let attempts = self.config.bootstrap_max_attempts.max(1);

        for attempt in 1..=attempts {
            match self.resolver.try_resolve(&self.city, &self.api_key).await {
                Ok(coord) => return Some(coord),
                Err(e) => {
                    warn!(attempt, attempts, error = %e, "geocoding attempt failed");
                }
            }
            if attempt < attempts {
                tokio::time::sleep(self.config.bootstrap_retry_delay).await;
            }
        }

        None
    }

    /// One download, parse and commit. The snapshot is only touched once the
    /// response is known to be valid JSON.
    pub async fn fetch_cycle(&self, coord: &Coordinates) -> Result<(), FetchError> {
        let url = self.endpoints.one_call(coord, &self.api_key);
        info!(lat = coord.latitude, lon = coord.longitude, "fetching weather data");

        let doc = {
            let size = self.config.response_buffer_size;
            let mut buffer = scratch_buffer(size).ok_or(FetchError::Allocation { bytes: size })?;
            let written = self.downloader.download(&url, &mut buffer).await?;
            parser::parse_document(&buffer[..written])?
        };

        let timeout = self.config.write_lock_timeout;
        let mut guard = self
            .cache
            .write_lock(timeout)
            .await
            .ok_or(LockTimeout(timeout))?;
        parser::apply(&doc, &mut guard);
        drop(guard);

        info!(generation = self.cache.generation(), "weather data updated");
        Ok(())
    }
}
