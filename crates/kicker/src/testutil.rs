//! Test doubles shared by the runtime modules.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use sk_domain::{Error, Result};
use sk_syncthing::{FolderStatus, SyncthingApi};

/// Configurable in-memory stand-in for a Syncthing instance.
#[derive(Default)]
pub struct FakeApi {
    /// Folder ids passed to `post_scan`, in call order.
    pub scans: Mutex<Vec<String>>,
    /// Folder ids passed to `folder_status`, in call order.
    pub status_requests: Mutex<Vec<String>>,
    /// Result of `folder_ids`.
    pub folders: Vec<String>,
    /// Make `folder_ids` fail.
    pub folder_ids_fails: bool,
    /// `post_scan` returns a deadline-exceeded error for this folder.
    pub scan_timeout_for: Option<String>,
    /// `folder_status` fails for this folder.
    pub status_fails_for: Option<String>,
    /// `folder_status` records the call, then never returns.
    pub hang_status: bool,
}

#[async_trait]
impl SyncthingApi for FakeApi {
    async fn post_scan(&self, folder: &str, _timeout: Duration) -> Result<()> {
        self.scans.lock().unwrap().push(folder.to_owned());
        match &self.scan_timeout_for {
            Some(f) if f == folder => Err(Error::Timeout("deadline exceeded".into())),
            _ => Ok(()),
        }
    }

    async fn folder_status(&self, folder: &str, _timeout: Duration) -> Result<FolderStatus> {
        self.status_requests.lock().unwrap().push(folder.to_owned());
        if self.hang_status {
            std::future::pending::<()>().await;
        }
        match &self.status_fails_for {
            Some(f) if f == folder => Err(Error::Http("status endpoint broke".into())),
            _ => Ok(FolderStatus {
                state: "idle".into(),
                need_bytes: 0,
                in_sync_bytes: 42,
            }),
        }
    }

    async fn folder_ids(&self, _timeout: Duration) -> Result<Vec<String>> {
        if self.folder_ids_fails {
            return Err(Error::Http("config endpoint broke".into()));
        }
        Ok(self.folders.clone())
    }
}

impl FakeApi {
    pub fn scanned(&self) -> Vec<String> {
        self.scans.lock().unwrap().clone()
    }

    pub fn status_requested(&self) -> Vec<String> {
        self.status_requests.lock().unwrap().clone()
    }
}

/// Poll `cond` until it holds; panics after a bounded number of attempts.
pub async fn wait_until(mut cond: impl FnMut() -> bool) {
    for _ in 0..1000 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not met");
}
