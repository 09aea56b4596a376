//! Reader side of the cache for a periodic display refresh.
//!
//! The reader keeps its own copy of the values it shows. A refresh that
//! cannot get the lock in time keeps that copy, so the display stays on the
//! last good data instead of blocking.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::cache::WeatherCache;
use crate::model::{Coordinates, CurrentWeather, NUM_MINUTELY};

pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A newer snapshot was copied.
    Updated,
    /// Nothing was committed since the last copy.
    Unchanged,
    /// The lock timed out; the previous copy is kept.
    Stale,
}

#[derive(Debug)]
pub struct DisplayReader {
    cache: Arc<WeatherCache>,
    timeout: Duration,
    seen_generation: u64,
    coord: Coordinates,
    current: CurrentWeather,
    precipitation: [i32; NUM_MINUTELY],
}

impl DisplayReader {
    pub fn new(cache: Arc<WeatherCache>, timeout: Duration) -> Self {
        Self {
            cache,
            timeout,
            seen_generation: 0,
            coord: Coordinates::default(),
            current: CurrentWeather::default(),
            precipitation: [0; NUM_MINUTELY],
        }
    }

    pub async fn refresh(&mut self) -> RefreshOutcome {
        let generation = self.cache.generation();
        if generation == self.seen_generation {
            return RefreshOutcome::Unchanged;
        }

        let Some(guard) = self.cache.read_lock(self.timeout).await else {
            warn!(timeout = ?self.timeout, "weather cache busy, keeping previous values");
            return RefreshOutcome::Stale;
        };

        self.coord.clone_from(&guard.coord);
        self.current.clone_from(&guard.current);
        self.precipitation = guard.scaled_minutely_precipitation();
        guard.unlock();

        // `generation` was read before locking, so a commit racing with this
        // copy is copied again on the next refresh.
        self.seen_generation = generation;
        debug!(generation, "display values refreshed");
        RefreshOutcome::Updated
    }

    pub fn coordinates(&self) -> &Coordinates {
        &self.coord
    }

    pub fn current(&self) -> &CurrentWeather {
        &self.current
    }

    pub fn scaled_minutely_precipitation(&self) -> &[i32; NUM_MINUTELY] {
        &self.precipitation
    }

    pub fn generation(&self) -> u64 {
        self.seen_generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    const SHORT: Duration = Duration::from_millis(20);

    async fn commit_temperature(cache: &WeatherCache, temperature: f32) {
        let mut guard = cache.write_lock(SHORT).await.unwrap();
        guard.current.temperature = temperature;
        guard.minutely[0].precipitation = 1.0;
    }

    #[tokio::test]
    async fn unchanged_until_first_commit() {
        let cache = Arc::new(WeatherCache::new());
        let mut reader = DisplayReader::new(Arc::clone(&cache), SHORT);

        assert_eq!(reader.refresh().await, RefreshOutcome::Unchanged);
        assert_eq!(*reader.current(), CurrentWeather::default());

        commit_temperature(&cache, 18.0).await;
        assert_eq!(reader.refresh().await, RefreshOutcome::Updated);
        assert_eq!(reader.current().temperature, 18.0);
        assert_eq!(reader.scaled_minutely_precipitation()[0], 60);
        assert_eq!(reader.generation(), 1);

        assert_eq!(reader.refresh().await, RefreshOutcome::Unchanged);
    }

    #[tokio::test]
    async fn lock_timeout_keeps_previous_values() {
        let cache = Arc::new(WeatherCache::new());
        let mut reader = DisplayReader::new(Arc::clone(&cache), SHORT);

        commit_temperature(&cache, 18.0).await;
        assert_eq!(reader.refresh().await, RefreshOutcome::Updated);

        commit_temperature(&cache, -99.0).await;
        let writer = cache.write_lock(SHORT).await.unwrap();

        let started = Instant::now();
        assert_eq!(reader.refresh().await, RefreshOutcome::Stale);
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(reader.current().temperature, 18.0);

        drop(writer);
        assert_eq!(reader.refresh().await, RefreshOutcome::Updated);
        assert_eq!(reader.current().temperature, -99.0);
    }
}
