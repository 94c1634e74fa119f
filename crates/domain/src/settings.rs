//! Environment-driven configuration.
//!
//! All validation happens here: downstream code only ever sees typed,
//! already-checked values. Lookups go through an injected closure so tests
//! never have to mutate the process environment.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono_tz::Tz;

use crate::error::{Error, Result};

/// Validated settings bundle, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base URL of the Syncthing REST API, normalized to end with `/`.
    pub api_url: String,
    /// Pre-shared API key sent as `X-API-Key` on every request.
    pub api_key: String,
    /// Global cron expression (`ST_CRON`); empty when unset.
    pub cron_expr: String,
    /// Per-folder cron overrides (`ST_FOLDER_CRON`), keyed by folder id.
    pub folder_cron: BTreeMap<String, String>,
    /// Target folders for the global schedule (`ST_FOLDERS`); `*` is the
    /// wildcard for "all folders".
    pub folders: Vec<String>,
    /// Timezone for schedule evaluation; `None` means UTC.
    pub cron_timezone: Option<Tz>,
    /// Delay before each post-trigger status check.
    pub status_delay: Duration,
    /// Overall HTTP request timeout; `None` leaves it to per-call limits.
    pub request_timeout: Option<Duration>,
    pub scan_on_startup: bool,
    pub run_once: bool,
    pub dry_run: bool,
    pub verify_tls: bool,
}

const DEFAULT_API_URL: &str = "http://127.0.0.1:8384";
const DEFAULT_STATUS_DELAY_SECS: f64 = 5.0;

impl Settings {
    /// Load and validate settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load and validate settings through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).unwrap_or_default();

        let mut api_url = get("ST_API_URL");
        if api_url.is_empty() {
            api_url = DEFAULT_API_URL.to_owned();
        }
        let api_url = api_url.trim();
        if api_url.is_empty() {
            return Err(Error::Config("ST_API_URL must not be empty".into()));
        }
        let api_url = format!("{}/", api_url.trim_end_matches('/'));

        let api_key = get("ST_API_KEY").trim().to_owned();
        if api_key.is_empty() {
            return Err(Error::Config(
                "ST_API_KEY environment variable is required".into(),
            ));
        }

        let cron_expr = get("ST_CRON").trim().to_owned();
        let folder_cron = parse_folder_cron(&get("ST_FOLDER_CRON"))?;

        if cron_expr.is_empty() && folder_cron.is_empty() {
            return Err(Error::Config(
                "no schedules configured (set ST_CRON and/or ST_FOLDER_CRON)".into(),
            ));
        }

        let mut tz_name = get("CRON_TZ").trim().to_owned();
        if tz_name.is_empty() {
            tz_name = get("TZ").trim().to_owned();
        }
        let cron_timezone = if tz_name.is_empty() {
            None
        } else {
            Some(tz_name.parse::<Tz>().map_err(|_| {
                Error::Config(format!("invalid CRON_TZ/TZ value: {tz_name:?}"))
            })?)
        };

        let status_delay = match non_negative_seconds("ST_STATUS_DELAY", &get("ST_STATUS_DELAY"))? {
            Some(v) => Duration::from_secs_f64(v),
            None => Duration::from_secs_f64(DEFAULT_STATUS_DELAY_SECS),
        };

        let request_timeout =
            match non_negative_seconds("ST_REQUEST_TIMEOUT", &get("ST_REQUEST_TIMEOUT"))? {
                Some(v) if v > 0.0 => Some(Duration::from_secs_f64(v)),
                _ => None,
            };

        Ok(Settings {
            api_url,
            api_key,
            cron_expr,
            folder_cron,
            folders: parse_folders(&get("ST_FOLDERS")),
            cron_timezone,
            status_delay,
            request_timeout,
            scan_on_startup: parse_bool(&get("SCAN_ON_STARTUP"), false),
            run_once: parse_bool(&get("RUN_ONCE"), false),
            dry_run: parse_bool(&get("DRY_RUN"), false),
            verify_tls: parse_bool(&get("ST_TLS_VERIFY"), true),
        })
    }
}

/// Parse `ST_FOLDERS`: comma-separated folder ids, blanks dropped.
/// Empty input means "everything", i.e. the wildcard.
pub fn parse_folders(raw: &str) -> Vec<String> {
    let out: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_owned)
        .collect();
    if out.is_empty() {
        vec!["*".to_owned()]
    } else {
        out
    }
}

/// Parse `ST_FOLDER_CRON`: one `folderId: <cron expr>` per line.
///
/// Lines are split on the *first* colon, so an expression containing further
/// colons is kept verbatim (cron validation rejects it later). Blank lines
/// and `#` comments are skipped. A folder id that repeats keeps its last
/// expression.
pub fn parse_folder_cron(raw: &str) -> Result<BTreeMap<String, String>> {
    let mut out = BTreeMap::new();
    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((folder, expr)) = line.split_once(':') else {
            return Err(Error::Config(
                "invalid ST_FOLDER_CRON line: expected 'folderId: <cron expr>'".into(),
            ));
        };
        let folder = folder.trim();
        let expr = expr.trim();
        if folder.is_empty() || expr.is_empty() {
            return Err(Error::Config(
                "invalid ST_FOLDER_CRON line: expected 'folderId: <cron expr>'".into(),
            ));
        }
        validate_folder_id(folder)?;
        out.insert(folder.to_owned(), expr.to_owned());
    }
    Ok(out)
}

/// Folder ids are simple slugs on the Syncthing side; whitespace and list
/// separators in an id are almost certainly a mangled config line.
fn validate_folder_id(folder: &str) -> Result<()> {
    if folder.contains([' ', '\t', '\r', '\n', ',', ';']) {
        return Err(Error::Config(format!(
            "invalid folder id in ST_FOLDER_CRON: {folder:?}"
        )));
    }
    Ok(())
}

fn parse_bool(raw: &str, default: bool) -> bool {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

/// Parse an optional seconds value. `Ok(None)` when unset; rejects
/// non-numeric, NaN, infinite, and negative input.
fn non_negative_seconds(name: &str, raw: &str) -> Result<Option<f64>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    let v: f64 = raw
        .parse()
        .map_err(|_| Error::Config(format!("invalid {name}: {raw:?}")))?;
    if !v.is_finite() || v < 0.0 {
        return Err(Error::Config(format!(
            "{name} must be >= 0 and finite, got {raw:?}"
        )));
    }
    Ok(Some(v))
}
