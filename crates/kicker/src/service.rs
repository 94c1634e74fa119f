//! Service orchestration: startup scans, the scheduler lifecycle, and the
//! one-shot status check.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sk_domain::{Result, Settings};
use sk_syncthing::SyncthingApi;
use tokio_util::sync::CancellationToken;

use crate::dispatch::Dispatcher;
use crate::pending::PendingSlots;
use crate::schedule::{ScheduleSet, Target};
use crate::scheduler::{CronScheduler, TickHandler};
use crate::status;

/// In-flight status check budget for the whole process.
const PENDING_CAPACITY: u32 = 1024;
/// How long shutdown waits for outstanding status checks.
const DRAIN_GRACE: Duration = Duration::from_secs(30);

pub struct Service {
    settings: Settings,
    api: Arc<dyn SyncthingApi>,
    slots: Arc<PendingSlots>,
    dispatcher: Dispatcher,
}

impl Service {
    pub fn new(settings: Settings, api: Arc<dyn SyncthingApi>) -> Self {
        let slots = PendingSlots::new(PENDING_CAPACITY);
        let dispatcher = Dispatcher::new(
            Arc::clone(&api),
            Arc::clone(&slots),
            settings.status_delay,
            settings.dry_run,
        );
        Self {
            settings,
            api,
            slots,
            dispatcher,
        }
    }

    /// Report status for the configured folders once, with no delay.
    pub async fn check_once(&self, cancel: &CancellationToken) -> Result<()> {
        status::check_status(
            self.api.as_ref(),
            &self.settings.folders,
            Duration::ZERO,
            cancel,
        )
        .await
    }

    /// Run until `shutdown` fires: optional startup scan, then the cron
    /// scheduler. Schedule validation failures abort before any timing
    /// loop starts.
    pub async fn run(self: Arc<Self>, shutdown: CancellationToken) -> Result<()> {
        if self.settings.scan_on_startup {
            tracing::info!("triggering scan on startup");
            self.dispatcher.trigger(&self.settings.folders).await?;
            for folder in self.settings.folder_cron.keys() {
                self.dispatcher.trigger(std::slice::from_ref(folder)).await?;
            }
            if self.settings.run_once {
                tracing::info!("run-once set; exiting after startup scan");
                self.slots.drain(DRAIN_GRACE).await;
                return Ok(());
            }
        }

        let set = ScheduleSet::from_settings(&self.settings)?;
        let mut scheduler = CronScheduler::new(set);
        scheduler.start(Arc::clone(&self) as Arc<dyn TickHandler>);

        shutdown.cancelled().await;
        tracing::info!("shutdown requested; stopping scheduler");
        scheduler.stop().await;
        self.slots.drain(DRAIN_GRACE).await;
        Ok(())
    }
}

#[async_trait]
impl TickHandler for Service {
    async fn fire(&self, target: &Target) -> Result<()> {
        self.dispatcher.trigger(&target.folder_ids()).await
    }
}
