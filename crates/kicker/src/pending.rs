//! Bounded permit pool for in-flight status checks.
//!
//! Acquisition never blocks: at capacity the caller simply skips the check.
//! A dropped status check is lost observability, not an error, so the pool
//! degrades by shedding work instead of back-pressuring the dispatcher.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug)]
pub struct PendingSlots {
    capacity: u32,
    in_flight: AtomicU32,
}

impl PendingSlots {
    pub fn new(capacity: u32) -> Arc<Self> {
        Arc::new(Self {
            capacity,
            in_flight: AtomicU32::new(0),
        })
    }

    /// Take one permit, or `None` at capacity.
    pub fn try_acquire(self: &Arc<Self>) -> Option<PendingSlot> {
        let mut current = self.in_flight.load(Ordering::SeqCst);
        loop {
            if current >= self.capacity {
                return None;
            }
            match self.in_flight.compare_exchange(
                current,
                current + 1,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => {
                    return Some(PendingSlot {
                        pool: Arc::clone(self),
                    })
                }
                Err(actual) => current = actual,
            }
        }
    }

    /// Permits currently out.
    pub fn in_flight(&self) -> u32 {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Wait until every permit is back or `timeout` elapses. Returns `true`
    /// when the pool drained fully.
    pub async fn drain(&self, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        while self.in_flight() > 0 {
            if tokio::time::Instant::now() >= deadline {
                tracing::warn!(
                    in_flight = self.in_flight(),
                    "grace period expired with status checks outstanding"
                );
                return false;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        true
    }
}

/// One in-flight status check. Dropping it returns the permit, whatever
/// path the owning task exits through.
#[derive(Debug)]
pub struct PendingSlot {
    pool: Arc<PendingSlots>,
}

impl Drop for PendingSlot {
    fn drop(&mut self) {
        self.pool.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}
