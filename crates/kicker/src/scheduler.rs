//! The timing core: one independent loop per schedule entry.
//!
//! Each loop computes its entry's next fire instant, sleeps until then, and
//! invokes the handler inline, so an entry never overlaps with its own next
//! tick while entries stay fully independent of each other. Stopping is
//! cooperative: the shared token wakes every sleeping loop, and a loop that
//! is mid-callback finishes before [`CronScheduler::stop`] returns.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use chrono_tz::Tz;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::schedule::{ScheduleEntry, ScheduleSet, Target};

/// Callback invoked at each fire instant. Errors are logged by the loop and
/// never stop the schedule.
#[async_trait]
pub trait TickHandler: Send + Sync + 'static {
    async fn fire(&self, target: &Target) -> sk_domain::Result<()>;
}

pub struct CronScheduler {
    entries: Vec<ScheduleEntry>,
    tz: Tz,
    cancel: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl CronScheduler {
    pub fn new(set: ScheduleSet) -> Self {
        Self {
            tz: set.tz(),
            entries: set.entries,
            cancel: CancellationToken::new(),
            handles: Vec::new(),
        }
    }

    /// Spawn one timing loop per entry. Returns immediately.
    pub fn start(&mut self, handler: Arc<dyn TickHandler>) {
        let count = self.entries.len();
        for entry in std::mem::take(&mut self.entries) {
            let tz = self.tz;
            let handler = Arc::clone(&handler);
            let cancel = self.cancel.clone();
            self.handles
                .push(tokio::spawn(entry_loop(entry, tz, handler, cancel)));
        }
        tracing::info!(entries = count, tz = %self.tz, "scheduler started");
    }

    /// Signal every loop to halt and wait for in-flight tick callbacks to
    /// return. Cooperative, not preemptive.
    pub async fn stop(self) {
        self.cancel.cancel();
        for handle in self.handles {
            if let Err(e) = handle.await {
                if e.is_panic() {
                    tracing::error!("scheduler loop panicked");
                }
            }
        }
        tracing::info!("scheduler stopped");
    }
}

async fn entry_loop(
    entry: ScheduleEntry,
    tz: Tz,
    handler: Arc<dyn TickHandler>,
    cancel: CancellationToken,
) {
    loop {
        let now = Utc::now();
        let Some(next) = entry.schedule.next_after(now, tz) else {
            tracing::warn!(expr = %entry.expr, "no future fire time; entry retired");
            return;
        };
        let wait = (next - now).to_std().unwrap_or_default();
        tracing::debug!(
            expr = %entry.expr,
            next = %next,
            wait_secs = wait.as_secs(),
            "waiting for next fire"
        );

        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(wait) => {}
        }

        if let Err(e) = handler.fire(&entry.target).await {
            tracing::error!(expr = %entry.expr, error = %e, "scheduled trigger failed");
        }
    }
}
