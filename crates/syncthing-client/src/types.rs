//! Response body types for the Syncthing endpoints we call.
//!
//! Syncthing returns far more fields than we use; everything is
//! `#[serde(default)]` so unknown states and missing keys never fail a
//! status check.

use serde::Deserialize;

/// Snapshot of one folder's sync state (GET /rest/db/status).
///
/// `state` is a free-form string reported by Syncthing ("idle", "scanning",
/// "syncing", ...); the byte counters are opaque remote-reported values.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderStatus {
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub need_bytes: i64,
    #[serde(default)]
    pub in_sync_bytes: i64,
}

/// The slice of GET /rest/system/config we care about: folder ids.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SystemConfig {
    #[serde(default)]
    pub folders: Vec<FolderConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FolderConfig {
    #[serde(default)]
    pub id: String,
}
