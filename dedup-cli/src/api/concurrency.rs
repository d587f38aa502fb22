//! Fetch limiter
//!
//! Bounds how many backend fetches the console runs at once when it fans out
//! over every source system of an entity.

use log::debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

use crate::config::FetchConfig;

/// Semaphore-based limiter shared by concurrent fetch tasks
#[derive(Debug, Clone)]
pub struct FetchLimiter {
    semaphore: Arc<Semaphore>,
    max_concurrent: usize,
    acquired: Arc<AtomicU64>,
    waited: Arc<AtomicU64>,
}

/// Snapshot of limiter usage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchLimiterStats {
    pub max_concurrent: usize,
    pub in_flight: usize,
    pub acquired: u64,
    pub waited: u64,
}

impl FetchLimiter {
    pub fn new(config: &FetchConfig) -> Self {
        let max_concurrent = config.max_concurrent.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            acquired: Arc::new(AtomicU64::new(0)),
            waited: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Wait for a free slot. The permit releases the slot when dropped.
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit, AcquireError> {
        if self.semaphore.available_permits() == 0 {
            self.waited.fetch_add(1, Ordering::Relaxed);
            debug!(
                "Fetch limiter: waiting for a slot ({} in flight)",
                self.max_concurrent
            );
        }

        let permit = self.semaphore.clone().acquire_owned().await?;
        self.acquired.fetch_add(1, Ordering::Relaxed);
        Ok(permit)
    }

    pub fn stats(&self) -> FetchLimiterStats {
        FetchLimiterStats {
            max_concurrent: self.max_concurrent,
            in_flight: self.max_concurrent - self.semaphore.available_permits(),
            acquired: self.acquired.load(Ordering::Relaxed),
            waited: self.waited.load(Ordering::Relaxed),
        }
    }
}
