//! The `SyncthingApi` trait defines the interface to a Syncthing instance
//! (REST in production, fakes in tests).

use std::time::Duration;

use async_trait::async_trait;
use sk_domain::Result;

use crate::types::FolderStatus;

/// Abstraction over the slice of the Syncthing REST surface this daemon
/// uses. All methods take a per-call timeout; implementations must report
/// deadline-exceeded as `Error::Timeout` so callers can treat it as soft.
#[async_trait]
pub trait SyncthingApi: Send + Sync {
    /// Trigger a folder re-scan (POST /rest/db/scan). An empty or `*`
    /// folder id requests a scan of everything.
    async fn post_scan(&self, folder: &str, timeout: Duration) -> Result<()>;

    /// Fetch sync status for one folder (GET /rest/db/status).
    async fn folder_status(&self, folder: &str, timeout: Duration) -> Result<FolderStatus>;

    /// List all configured folder ids (GET /rest/system/config).
    async fn folder_ids(&self, timeout: Duration) -> Result<Vec<String>>;
}
