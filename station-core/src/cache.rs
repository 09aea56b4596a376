//! The shared weather snapshot and its lock.
//!
//! There is exactly one [`WeatherSnapshot`] per cache. The scheduler
//! overwrites it in place through a [`WriteGuard`]; readers copy values out
//! through a [`ReadGuard`]. Both go through the same exclusive lock, and every
//! acquisition is bounded by a timeout.

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, MutexGuard};

use crate::error::LockTimeout;
use crate::model::{CurrentWeather, NUM_MINUTELY, WeatherSnapshot, unix_to_utc};

#[derive(Debug, Default)]
pub struct WeatherCache {
    snapshot: Mutex<WeatherSnapshot>,
    generation: AtomicU64,
    last_updated: AtomicI64,
}

impl WeatherCache {
    /// A cache holding a zeroed snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Exclusive access for overwriting the snapshot, or `None` if the lock
    /// was not free within `timeout`.
    pub async fn write_lock(&self, timeout: Duration) -> Option<WriteGuard<'_>> {
        let guard = tokio::time::timeout(timeout, self.snapshot.lock()).await.ok()?;
        Some(WriteGuard { guard, cache: self })
    }

    /// Read access, or `None` if the lock was not free within `timeout`.
    pub async fn read_lock(&self, timeout: Duration) -> Option<ReadGuard<'_>> {
        let guard = tokio::time::timeout(timeout, self.snapshot.lock()).await.ok()?;
        Some(ReadGuard { guard })
    }

    /// [`read_lock`](Self::read_lock) with the timeout in milliseconds. The
    /// lock is released by [`ReadGuard::unlock`] or by dropping the guard.
    pub async fn lock_for_read(&self, timeout_ms: u64) -> Option<ReadGuard<'_>> {
        self.read_lock(Duration::from_millis(timeout_ms)).await
    }

    pub async fn current(&self, timeout: Duration) -> Result<CurrentWeather, LockTimeout> {
        let guard = self.read_lock(timeout).await.ok_or(LockTimeout(timeout))?;
        Ok(guard.current.clone())
    }

    /// Minutely precipitation in mm/h.
    pub async fn scaled_minutely_precipitation(
        &self,
        timeout: Duration,
    ) -> Result<[i32; NUM_MINUTELY], LockTimeout> {
        let guard = self.read_lock(timeout).await.ok_or(LockTimeout(timeout))?;
        Ok(guard.scaled_minutely_precipitation())
    }

    /// Full copy of the snapshot.
    pub async fn snapshot(&self, timeout: Duration) -> Result<WeatherSnapshot, LockTimeout> {
        let guard = self.read_lock(timeout).await.ok_or(LockTimeout(timeout))?;
        Ok(guard.clone())
    }

    /// Number of completed writes. Readable without the lock.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// When the last write completed, if any.
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        unix_to_utc(self.last_updated.load(Ordering::Acquire))
    }
}

/// Shared access to the snapshot while the lock is held.
#[derive(Debug)]
pub struct ReadGuard<'a> {
    guard: MutexGuard<'a, WeatherSnapshot>,
}

impl ReadGuard<'_> {
    pub fn unlock(self) {}
}

impl Deref for ReadGuard<'_> {
    type Target = WeatherSnapshot;

    fn deref(&self) -> &WeatherSnapshot {
        &self.guard
    }
}

/// Mutable access to the snapshot. Releasing it counts as a commit.
#[derive(Debug)]
pub struct WriteGuard<'a> {
    guard: MutexGuard<'a, WeatherSnapshot>,
    cache: &'a WeatherCache,
}

impl Deref for WriteGuard<'_> {
    type Target = WeatherSnapshot;

    fn deref(&self) -> &WeatherSnapshot {
        &self.guard
    }
}

impl DerefMut for WriteGuard<'_> {
    fn deref_mut(&mut self) -> &mut WeatherSnapshot {
        &mut self.guard
    }
}

impl Drop for WriteGuard<'_> {
    // Runs before `guard` is dropped, i.e. while the lock is still held.
    fn drop(&mut self) {
        self.cache
            .last_updated
            .store(Utc::now().timestamp(), Ordering::Release);
        self.cache.generation.fetch_add(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Instant;

    const SHORT: Duration = Duration::from_millis(20);

    #[tokio::test]
    async fn new_cache_is_zeroed_and_uncommitted() {
        let cache = WeatherCache::new();
        assert_eq!(cache.generation(), 0);
        assert!(cache.last_updated().is_none());

        let snapshot = cache.snapshot(SHORT).await.unwrap();
        assert_eq!(snapshot, WeatherSnapshot::default());
    }

    #[tokio::test]
    async fn write_guard_release_commits() {
        let cache = WeatherCache::new();
        {
            let mut guard = cache.write_lock(SHORT).await.unwrap();
            guard.current.temperature = 21.5;
            guard.minutely[0].precipitation = 0.5;
        }

        assert_eq!(cache.generation(), 1);
        assert!(cache.last_updated().is_some());
        assert_eq!(cache.current(SHORT).await.unwrap().temperature, 21.5);

        let scaled = cache.scaled_minutely_precipitation(SHORT).await.unwrap();
        assert_eq!(scaled[0], 30);
        assert!(scaled[1..].iter().all(|v| *v == 0));
    }

    #[tokio::test]
    async fn reader_times_out_while_writer_holds_lock() {
        let cache = WeatherCache::new();
        let _writer = cache.write_lock(SHORT).await.unwrap();

        let started = Instant::now();
        assert!(cache.read_lock(SHORT).await.is_none());
        assert!(started.elapsed() < Duration::from_secs(1));

        let err = cache.current(SHORT).await.unwrap_err();
        assert_eq!(err, LockTimeout(SHORT));
    }

    #[tokio::test]
    async fn writer_times_out_while_reader_holds_lock() {
        let cache = WeatherCache::new();
        let reader = cache.lock_for_read(20).await.unwrap();

        assert!(cache.write_lock(SHORT).await.is_none());
        assert_eq!(cache.generation(), 0);

        reader.unlock();
        assert!(cache.write_lock(SHORT).await.is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn readers_never_observe_half_written_snapshot() {
        let cache = Arc::new(WeatherCache::new());

        let writer = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move {
                for i in 1..=20 {
                    let mut guard = cache.write_lock(Duration::from_secs(1)).await.unwrap();
                    guard.current.temperature = i as f32;
                    tokio::time::sleep(Duration::from_millis(2)).await;
                    guard.current.feels_like = i as f32;
                }
            })
        };

        let mut observed = 0;
        while !writer.is_finished() {
            if let Some(guard) = cache.read_lock(Duration::from_millis(5)).await {
                assert_eq!(guard.current.temperature, guard.current.feels_like);
                observed += 1;
            }
            tokio::task::yield_now().await;
        }
        writer.await.unwrap();

        assert!(observed > 0);
        assert_eq!(cache.generation(), 20);
    }
}
