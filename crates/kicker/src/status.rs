//! Post-trigger status reporting.
//!
//! Status checks are observability, not control flow: every remote failure
//! here is logged and swallowed. The one error surfaced to the caller is
//! cancellation, so a one-shot "check and exit" invocation can report a
//! non-zero exit.

use std::time::Duration;

use sk_domain::{Error, Result};
use sk_syncthing::SyncthingApi;
use tokio_util::sync::CancellationToken;

/// Folder id meaning "all folders", resolved against the live config.
pub const WILDCARD: &str = "*";

/// Per-folder status fetch deadline.
const STATUS_TIMEOUT: Duration = Duration::from_secs(10);
/// Deadline for the config listing used to resolve the wildcard.
const CONFIG_TIMEOUT: Duration = Duration::from_secs(15);

/// Report sync status for `folders`, after an optional delay.
///
/// A wildcard anywhere in `folders` replaces the whole request with the
/// live folder list; if that lookup fails or comes back empty there is
/// nothing to report and the check still succeeds.
pub async fn check_status(
    api: &dyn SyncthingApi,
    folders: &[String],
    delay: Duration,
    cancel: &CancellationToken,
) -> Result<()> {
    if delay > Duration::ZERO {
        tokio::select! {
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            _ = tokio::time::sleep(delay) => {}
        }
    }

    let want_all = folders.iter().any(|f| f.trim() == WILDCARD);

    let folder_ids: Vec<String> = if want_all {
        match api.folder_ids(CONFIG_TIMEOUT).await {
            Ok(ids) => ids,
            Err(e) => {
                tracing::warn!(error = %e, "failed to fetch folder list for wildcard status check");
                return Ok(());
            }
        }
    } else {
        folders
            .iter()
            .map(|f| f.trim())
            .filter(|f| !f.is_empty() && *f != WILDCARD)
            .map(str::to_owned)
            .collect()
    };

    if want_all && folder_ids.is_empty() {
        tracing::info!("no folders in syncthing config; nothing to report");
        return Ok(());
    }

    for folder in &folder_ids {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        match api.folder_status(folder, STATUS_TIMEOUT).await {
            Ok(st) => tracing::info!(
                %folder,
                state = %st.state,
                need_bytes = st.need_bytes,
                in_sync_bytes = st.in_sync_bytes,
                "folder status"
            ),
            Err(e) => tracing::warn!(%folder, error = %e, "folder status check failed"),
        }
    }
    Ok(())
}
