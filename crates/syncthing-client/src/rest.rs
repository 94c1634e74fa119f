//! REST implementation of [`SyncthingApi`].
//!
//! `RestSyncthingClient` wraps a `reqwest::Client` and translates every
//! trait method into the corresponding HTTP call against the Syncthing
//! REST API. There is deliberately no retry layer here: a failed trigger
//! simply waits for the next scheduled fire.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use sk_domain::{Error, Result};

use crate::provider::SyncthingApi;
use crate::types::{FolderStatus, SystemConfig};

/// Connection options, carried over from the validated settings.
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    /// Verify TLS certificates (disable only for self-signed GUIs).
    pub verify_tls: bool,
    /// Client-wide request timeout; per-call timeouts still apply on top.
    pub request_timeout: Option<Duration>,
}

/// A REST client for one Syncthing instance.
///
/// Created once at startup and shared for the life of the process; the
/// underlying `reqwest::Client` keeps a connection pool.
#[derive(Debug, Clone)]
pub struct RestSyncthingClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl RestSyncthingClient {
    /// Build a client for `api_url`, authenticating with `api_key`.
    pub fn new(api_url: &str, api_key: &str, opts: ClientOptions) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = opts.request_timeout {
            builder = builder.timeout(timeout);
        }
        if !opts.verify_tls {
            builder = builder.danger_accept_invalid_certs(true);
        }
        let http = builder.build().map_err(|e| Error::Http(e.to_string()))?;

        Ok(Self {
            http,
            base_url: format!("{}/", api_url.trim_end_matches('/')),
            api_key: api_key.to_owned(),
        })
    }

    // ── request helpers ──────────────────────────────────────────────

    /// Full URL for a path like `rest/db/scan`.
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Decorate a request with auth and the per-call timeout.
    fn decorate(&self, rb: RequestBuilder, timeout: Duration) -> RequestBuilder {
        rb.header("X-API-Key", &self.api_key)
            .header("Accept", "application/json")
            .timeout(timeout)
    }

    /// Send a request and map transport and HTTP-level failures.
    ///
    /// Status >= 400 becomes `Error::Http` carrying the trimmed response
    /// body; timeouts become `Error::Timeout` so callers can classify them.
    async fn execute(&self, endpoint: &str, rb: RequestBuilder) -> Result<Response> {
        let resp = rb.send().await.map_err(from_reqwest)?;
        let status = resp.status();
        tracing::debug!(endpoint, status = status.as_u16(), "syncthing api response");
        if status.as_u16() >= 400 {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Http(format!(
                "{endpoint} returned {}: {}",
                status.as_u16(),
                body.trim()
            )));
        }
        Ok(resp)
    }

    async fn read_json<T: DeserializeOwned>(&self, endpoint: &str, resp: Response) -> Result<T> {
        let body = resp.text().await.map_err(from_reqwest)?;
        serde_json::from_str(&body)
            .map_err(|e| Error::Http(format!("{endpoint}: failed to parse response: {e}: {body}")))
    }
}

/// The `folder` query parameter for a scan request, if any. Empty and `*`
/// ids map to "scan everything", which Syncthing expresses as no parameter.
fn scan_folder_param(folder: &str) -> Option<&str> {
    let folder = folder.trim();
    if folder.is_empty() || folder == "*" {
        None
    } else {
        Some(folder)
    }
}

#[async_trait]
impl SyncthingApi for RestSyncthingClient {
    async fn post_scan(&self, folder: &str, timeout: Duration) -> Result<()> {
        let url = self.url("rest/db/scan");
        let mut rb = self.http.post(&url);
        if let Some(folder) = scan_folder_param(folder) {
            rb = rb.query(&[("folder", folder)]);
        }
        self.execute("POST /rest/db/scan", self.decorate(rb, timeout))
            .await?;
        Ok(())
    }

    async fn folder_status(&self, folder: &str, timeout: Duration) -> Result<FolderStatus> {
        let url = self.url("rest/db/status");
        let rb = self.http.get(&url).query(&[("folder", folder)]);
        let resp = self
            .execute("GET /rest/db/status", self.decorate(rb, timeout))
            .await?;
        self.read_json("GET /rest/db/status", resp).await
    }

    async fn folder_ids(&self, timeout: Duration) -> Result<Vec<String>> {
        let url = self.url("rest/system/config");
        let rb = self.http.get(&url);
        let resp = self
            .execute("GET /rest/system/config", self.decorate(rb, timeout))
            .await?;
        let cfg: SystemConfig = self.read_json("GET /rest/system/config", resp).await?;
        Ok(cfg
            .folders
            .into_iter()
            .map(|f| f.id)
            .filter(|id| !id.trim().is_empty())
            .collect())
    }
}

/// Convert a `reqwest::Error` into a domain error, keeping timeouts
/// distinguishable from other transport failures.
fn from_reqwest(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else {
        Error::Http(e.to_string())
    }
}
