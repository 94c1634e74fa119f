//! Trigger dispatch: best-effort scan calls plus fire-and-forget status
//! checks.
//!
//! Remote failures never cross this boundary. A scan trigger that times out
//! is logged as soft (Syncthing may hold the POST open while it scans and
//! usually ran the scan anyway); any other failure is logged and the batch
//! continues with the remaining folders.

use std::sync::Arc;
use std::time::Duration;

use sk_syncthing::SyncthingApi;
use tokio_util::sync::CancellationToken;

use crate::pending::PendingSlots;
use crate::status;

/// Per-call deadline for scan triggers. Kept short on purpose; see the
/// module docs.
const SCAN_TIMEOUT: Duration = Duration::from_secs(5);

pub struct Dispatcher {
    api: Arc<dyn SyncthingApi>,
    slots: Arc<PendingSlots>,
    status_delay: Duration,
    dry_run: bool,
}

impl Dispatcher {
    pub fn new(
        api: Arc<dyn SyncthingApi>,
        slots: Arc<PendingSlots>,
        status_delay: Duration,
        dry_run: bool,
    ) -> Self {
        Self {
            api,
            slots,
            status_delay,
            dry_run,
        }
    }

    /// Trigger a scan for every folder in `folders` and spawn a delayed
    /// status check per folder, permits allowing. Always returns `Ok`:
    /// individual failures are logged and a saturated permit pool only
    /// costs the follow-up check, never the trigger.
    pub async fn trigger(&self, folders: &[String]) -> sk_domain::Result<()> {
        for folder in folders {
            let folder = folder.trim();
            if folder.is_empty() {
                continue;
            }

            if self.dry_run {
                tracing::info!(folder, "dry-run: would trigger scan");
            } else {
                match self.api.post_scan(folder, SCAN_TIMEOUT).await {
                    Ok(()) => tracing::info!(folder, "triggered scan"),
                    Err(e) if e.is_timeout() => tracing::warn!(
                        folder,
                        "scan trigger timed out; syncthing may still be processing"
                    ),
                    Err(e) => tracing::warn!(folder, error = %e, "scan trigger failed"),
                }
            }

            let Some(slot) = self.slots.try_acquire() else {
                tracing::debug!(folder, "status check skipped: pending pool at capacity");
                continue;
            };

            let api = Arc::clone(&self.api);
            let folder = folder.to_owned();
            let delay = self.status_delay;
            tokio::spawn(async move {
                // Holds the permit for the life of the task. The token is
                // this task's own: daemon shutdown drains instead of
                // cancelling detached checks.
                let _slot = slot;
                let cancel = CancellationToken::new();
                let _ = status::check_status(
                    api.as_ref(),
                    std::slice::from_ref(&folder),
                    delay,
                    &cancel,
                )
                .await;
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{wait_until, FakeApi};

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn dispatcher(api: Arc<FakeApi>, capacity: u32) -> (Dispatcher, Arc<PendingSlots>) {
        let slots = PendingSlots::new(capacity);
        let d = Dispatcher::new(api, Arc::clone(&slots), Duration::ZERO, false);
        (d, slots)
    }

    #[tokio::test]
    async fn triggers_scan_and_status_check_per_folder() {
        let api = Arc::new(FakeApi::default());
        let (d, _slots) = dispatcher(Arc::clone(&api), 16);

        d.trigger(&ids(&["photos", "docs"])).await.unwrap();

        assert_eq!(api.scanned(), ids(&["photos", "docs"]));
        wait_until(|| api.status_requested().len() == 2).await;
    }

    #[tokio::test]
    async fn blank_ids_are_skipped() {
        let api = Arc::new(FakeApi::default());
        let (d, slots) = dispatcher(Arc::clone(&api), 16);

        d.trigger(&ids(&["", "  ", " photos "])).await.unwrap();

        assert_eq!(api.scanned(), ids(&["photos"]));
        assert_eq!(slots.in_flight(), 1);
    }

    #[tokio::test]
    async fn timeout_on_one_folder_does_not_abort_the_batch() {
        let api = Arc::new(FakeApi {
            scan_timeout_for: Some("photos".into()),
            ..FakeApi::default()
        });
        let (d, _slots) = dispatcher(Arc::clone(&api), 16);

        d.trigger(&ids(&["photos", "docs"])).await.unwrap();

        // Both scans attempted, and the overall call still succeeded.
        assert_eq!(api.scanned(), ids(&["photos", "docs"]));
        wait_until(|| api.status_requested().len() == 2).await;
    }

    #[tokio::test]
    async fn dry_run_skips_the_network_but_not_the_check() {
        let api = Arc::new(FakeApi::default());
        let slots = PendingSlots::new(16);
        let d = Dispatcher::new(
            Arc::clone(&api) as Arc<dyn SyncthingApi>,
            Arc::clone(&slots),
            Duration::ZERO,
            true,
        );

        d.trigger(&ids(&["photos"])).await.unwrap();

        assert!(api.scanned().is_empty(), "dry-run must not hit the network");
        wait_until(|| api.status_requested() == ids(&["photos"])).await;
    }

    #[tokio::test]
    async fn saturated_pool_skips_checks_but_not_triggers() {
        // Capacity 2, three folders: all three scans fire, at most two
        // status checks spawn. Hanging status calls keep permits held.
        let api = Arc::new(FakeApi {
            hang_status: true,
            ..FakeApi::default()
        });
        let (d, slots) = dispatcher(Arc::clone(&api), 2);

        d.trigger(&ids(&["a", "b", "c"])).await.unwrap();

        assert_eq!(api.scanned(), ids(&["a", "b", "c"]));
        assert_eq!(slots.in_flight(), 2);
        wait_until(|| api.status_requested().len() == 2).await;
        // The third folder never got a check. Spawned tasks run in any
        // order, so compare sorted.
        let mut checked = api.status_requested();
        checked.sort();
        assert_eq!(checked, ids(&["a", "b"]));
    }

    #[tokio::test]
    async fn permits_return_after_checks_finish() {
        let api = Arc::new(FakeApi::default());
        let (d, slots) = dispatcher(Arc::clone(&api), 4);

        d.trigger(&ids(&["a", "b"])).await.unwrap();
        wait_until(|| slots.in_flight() == 0).await;
    }
}
