//! Process-wide concurrency budget
//!
//! Bounds the number of simultaneous network operations across the whole
//! run. One unit is acquired before every store call, whether it is a
//! whole-file put or a single part upload, and released unconditionally
//! when the attempt finishes.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Shared bound on in-flight store operations
#[derive(Clone)]
pub struct ConcurrencyBudget {
    semaphore: Arc<Semaphore>,
    limit: usize,
    in_flight: Arc<AtomicUsize>,
    high_water: Arc<AtomicUsize>,
}

impl ConcurrencyBudget {
    /// Create a budget allowing `limit` simultaneous operations
    pub fn new(limit: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(limit)),
            limit,
            in_flight: Arc::new(AtomicUsize::new(0)),
            high_water: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Acquire one unit, waiting until one is free.
    ///
    /// The returned permit releases the unit when dropped, on every exit
    /// path of the operation holding it.
    pub async fn acquire(&self) -> BudgetPermit {
        // The semaphore is owned by this budget and never closed.
        let permit = self.semaphore.clone().acquire_owned().await.unwrap();
        let now = self.in_flight.fetch_add(1, Ordering::Relaxed) + 1;
        self.high_water.fetch_max(now, Ordering::Relaxed);
        BudgetPermit {
            _permit: permit,
            in_flight: self.in_flight.clone(),
        }
    }

    /// Try to acquire without waiting
    pub fn try_acquire(&self) -> Option<BudgetPermit> {
        match self.semaphore.clone().try_acquire_owned() {
            Ok(permit) => {
                let now = self.in_flight.fetch_add(1, Ordering::Relaxed) + 1;
                self.high_water.fetch_max(now, Ordering::Relaxed);
                Some(BudgetPermit {
                    _permit: permit,
                    in_flight: self.in_flight.clone(),
                })
            }
            Err(_) => None,
        }
    }

    /// Configured bound
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Operations currently holding a unit
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// Highest number of units ever held at once
    pub fn high_water(&self) -> usize {
        self.high_water.load(Ordering::Relaxed)
    }
}

/// Permit for one in-flight store operation
pub struct BudgetPermit {
    _permit: OwnedSemaphorePermit,
    in_flight: Arc<AtomicUsize>,
}

impl Drop for BudgetPermit {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::Relaxed);
    }
}
