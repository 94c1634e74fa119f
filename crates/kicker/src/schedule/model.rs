//! Schedule data model: targets, entries, and the validated set.

use std::collections::BTreeMap;

use chrono_tz::Tz;
use sk_domain::{Error, Result, Settings};

use super::cron::CronSchedule;

/// What a schedule entry triggers: everything, or a fixed folder list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// The wildcard; resolved against the live folder list at check time.
    All,
    Folders(Vec<String>),
}

impl Target {
    /// Build a target from a configured folder list. Any `*` in the list
    /// widens the whole target to everything.
    pub fn from_folders(folders: &[String]) -> Self {
        let trimmed: Vec<String> = folders
            .iter()
            .map(|f| f.trim())
            .filter(|f| !f.is_empty())
            .map(str::to_owned)
            .collect();
        if trimmed.is_empty() || trimmed.iter().any(|f| f == "*") {
            Target::All
        } else {
            Target::Folders(trimmed)
        }
    }

    /// Folder ids as the dispatcher consumes them; the wildcard is the
    /// single id `*`.
    pub fn folder_ids(&self) -> Vec<String> {
        match self {
            Target::All => vec!["*".to_owned()],
            Target::Folders(ids) => ids.clone(),
        }
    }
}

/// One schedule rule: a cron expression bound to a target. Immutable once
/// the scheduler is built.
#[derive(Debug, Clone)]
pub struct ScheduleEntry {
    /// Original expression text, for logging.
    pub expr: String,
    pub schedule: CronSchedule,
    pub target: Target,
}

/// The validated aggregate the scheduler runs: at least one entry, plus the
/// evaluation timezone.
#[derive(Debug, Clone)]
pub struct ScheduleSet {
    pub entries: Vec<ScheduleEntry>,
    pub timezone: Option<Tz>,
}

impl ScheduleSet {
    /// Validate and assemble the schedule set: an optional global entry
    /// (empty expression contributes none) plus one entry per folder
    /// override. Zero entries overall is an error.
    pub fn build(
        global_expr: &str,
        global_folders: &[String],
        folder_cron: &BTreeMap<String, String>,
        timezone: Option<Tz>,
    ) -> Result<Self> {
        let mut entries = Vec::new();

        let global_expr = global_expr.trim();
        if !global_expr.is_empty() {
            entries.push(ScheduleEntry {
                expr: global_expr.to_owned(),
                schedule: CronSchedule::parse(global_expr)?,
                target: Target::from_folders(global_folders),
            });
        }

        for (folder, expr) in folder_cron {
            let schedule = CronSchedule::parse(expr).map_err(|e| match e {
                Error::Config(msg) => Error::Config(format!("folder {folder:?}: {msg}")),
                other => other,
            })?;
            entries.push(ScheduleEntry {
                expr: expr.clone(),
                schedule,
                target: Target::Folders(vec![folder.clone()]),
            });
        }

        if entries.is_empty() {
            return Err(Error::Config(
                "no schedules configured (set ST_CRON and/or ST_FOLDER_CRON)".into(),
            ));
        }

        Ok(Self { entries, timezone })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::build(
            &settings.cron_expr,
            &settings.folders,
            &settings.folder_cron,
            settings.cron_timezone,
        )
    }

    /// Effective evaluation zone; UTC when none was configured.
    pub fn tz(&self) -> Tz {
        self.timezone.unwrap_or(chrono_tz::UTC)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn folder_cron(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn global_schedule_alone_builds_one_entry() {
        let set = ScheduleSet::build("*/5 * * * *", &["*".to_owned()], &folder_cron(&[]), None)
            .unwrap();
        assert_eq!(set.entries.len(), 1);
        assert_eq!(set.entries[0].expr, "*/5 * * * *");
        assert_eq!(set.entries[0].target, Target::All);
        assert_eq!(set.tz(), chrono_tz::UTC);
    }

    #[test]
    fn folder_schedule_alone_builds_one_entry() {
        let set = ScheduleSet::build("", &[], &folder_cron(&[("folderA", "0 0 * * *")]), None)
            .unwrap();
        assert_eq!(set.entries.len(), 1);
        assert_eq!(
            set.entries[0].target,
            Target::Folders(vec!["folderA".to_owned()])
        );
    }

    #[test]
    fn global_and_folder_schedules_combine() {
        let set = ScheduleSet::build(
            "*/10 * * * *",
            &["photos".to_owned(), "docs".to_owned()],
            &folder_cron(&[("music", "0 4 * * *")]),
            Some(chrono_tz::Europe::Lisbon),
        )
        .unwrap();
        assert_eq!(set.entries.len(), 2);
        assert_eq!(
            set.entries[0].target,
            Target::Folders(vec!["photos".to_owned(), "docs".to_owned()])
        );
        assert_eq!(set.tz(), chrono_tz::Europe::Lisbon);
    }

    #[test]
    fn no_schedules_is_an_error() {
        let err = ScheduleSet::build("", &[], &folder_cron(&[]), None).unwrap_err();
        assert!(err.to_string().contains("no schedules configured"));
    }

    #[test]
    fn whitespace_global_expression_counts_as_absent() {
        let err = ScheduleSet::build("   ", &[], &folder_cron(&[]), None).unwrap_err();
        assert!(err.to_string().contains("no schedules configured"));
    }

    #[test]
    fn invalid_global_expression_is_rejected() {
        assert!(ScheduleSet::build("60 * * * *", &[], &folder_cron(&[]), None).is_err());
    }

    #[test]
    fn invalid_folder_expression_names_the_folder() {
        let err = ScheduleSet::build("", &[], &folder_cron(&[("photos", "not a cron")]), None)
            .unwrap_err();
        assert!(err.to_string().contains("photos"));
    }

    #[test]
    fn one_bad_folder_fails_the_whole_set() {
        let err = ScheduleSet::build(
            "",
            &[],
            &folder_cron(&[("good", "0 0 * * *"), ("bad", "* * * * * *")]),
            None,
        )
        .unwrap_err();
        assert!(err.to_string().contains("bad"));
    }

    #[test]
    fn target_wildcard_anywhere_widens_to_all() {
        let folders = vec!["photos".to_owned(), "*".to_owned()];
        assert_eq!(Target::from_folders(&folders), Target::All);
        assert_eq!(Target::from_folders(&[]), Target::All);
        assert_eq!(Target::from_folders(&["  ".to_owned()]), Target::All);
    }

    #[test]
    fn target_folder_ids_round_trip() {
        assert_eq!(Target::All.folder_ids(), vec!["*"]);
        let t = Target::from_folders(&[" photos ".to_owned(), "docs".to_owned()]);
        assert_eq!(t.folder_ids(), vec!["photos", "docs"]);
    }
}
