//! Bounded concurrency for tile fetches.
//!
//! A semaphore-based limiter constrains the total number of concurrent
//! tile downloads across the whole service. A pan across a large model
//! can resolve to dozens of tiles at once; without a bound the service
//! would open that many HTTP connections simultaneously and trip
//! provider rate limits.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Limiter for concurrent tile fetches.
///
/// Wraps a Tokio semaphore; a permit must be held for the duration of
/// each download and is released when dropped.
#[derive(Debug)]
pub struct FetchLimiter {
    semaphore: Arc<Semaphore>,
    max_permits: usize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl FetchLimiter {
    /// Creates a limiter allowing at most `max_concurrent` fetches.
    ///
    /// # Panics
    ///
    /// Panics if `max_concurrent` is 0.
    pub fn new(max_concurrent: usize) -> Self {
        assert!(max_concurrent > 0, "max_concurrent must be > 0");

        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            max_permits: max_concurrent,
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    /// Creates a limiter with CPU-based default concurrency:
    /// `min(available_parallelism * 4, 64)`.
    pub fn with_default_concurrency() -> Self {
        Self::new(default_concurrency())
    }

    /// Acquires a permit, waiting if the limit has been reached.
    pub async fn acquire(&self) -> FetchPermit<'_> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("semaphore closed unexpectedly");

        let current = self.in_flight.fetch_add(1, Ordering::Relaxed) + 1;
        self.update_peak(current);

        FetchPermit {
            _permit: permit,
            in_flight: &self.in_flight,
        }
    }

    /// Tries to acquire a permit without waiting.
    pub fn try_acquire(&self) -> Option<FetchPermit<'_>> {
        let permit = self.semaphore.clone().try_acquire_owned().ok()?;

        let current = self.in_flight.fetch_add(1, Ordering::Relaxed) + 1;
        self.update_peak(current);

        Some(FetchPermit {
            _permit: permit,
            in_flight: &self.in_flight,
        })
    }

    fn update_peak(&self, current: usize) {
        let mut peak = self.peak_in_flight.load(Ordering::Relaxed);
        while current > peak {
            match self.peak_in_flight.compare_exchange_weak(
                peak,
                current,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(p) => peak = p,
            }
        }
    }

    /// Maximum concurrent fetches allowed.
    pub fn max_concurrent(&self) -> usize {
        self.max_permits
    }

    /// Current number of in-flight fetches.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// Peak concurrent fetches observed.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::Relaxed)
    }

    /// Number of available permits.
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }
}

/// Default fetch concurrency: `min(available_parallelism * 4, 64)`.
pub fn default_concurrency() -> usize {
    let cpus = std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(4);
    (cpus * 4).min(64)
}

/// A permit for one tile fetch, counted against the limit while held.
pub struct FetchPermit<'a> {
    _permit: OwnedSemaphorePermit,
    in_flight: &'a AtomicUsize,
}

impl Drop for FetchPermit<'_> {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::Relaxed);
    }
}
