//! Timezone-aware cron schedules (5-field: min hour dom month dow).
//!
//! Expressions are parsed once into per-field value sets; evaluation never
//! re-parses. **DST handling:** local times inside a spring-forward gap are
//! skipped; fall-back overlaps resolve to the earliest (pre-transition)
//! instant.

use chrono::{DateTime, Datelike, LocalResult, NaiveDateTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use sk_domain::{Error, Result};

/// field name, minimum, maximum, in expression order.
const FIELDS: [(&str, u32, u32); 5] = [
    ("minute", 0, 59),
    ("hour", 0, 23),
    ("day-of-month", 1, 31),
    ("month", 1, 12),
    ("day-of-week", 0, 6),
];

/// One year of minutes; the search bound for the next occurrence.
const MAX_CHECKS: u32 = 366 * 24 * 60;

/// A parsed, validated 5-field cron expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronSchedule {
    minutes: FieldSet,
    hours: FieldSet,
    days_of_month: FieldSet,
    months: FieldSet,
    days_of_week: FieldSet,
}

/// Admitted values for one field, as a bitmask (domains all fit in 0..=59).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FieldSet(u64);

impl FieldSet {
    fn contains(self, value: u32) -> bool {
        value < 64 && self.0 & (1 << value) != 0
    }
}

impl CronSchedule {
    /// Parse an expression of exactly 5 whitespace-separated fields.
    ///
    /// Per-field grammar: `*`, `N`, `N-M` (inclusive, `N <= M`), `*/S`,
    /// `N-M/S` (`S >= 1`), and comma-separated lists of those. Steps count
    /// from the range minimum, so `*/10` on day-of-month means 1,11,21,31.
    pub fn parse(expr: &str) -> Result<Self> {
        let fields: Vec<&str> = expr.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(Error::Config(format!(
                "invalid cron {expr:?}: expected 5 fields (minute hour dom month dow), got {}",
                fields.len()
            )));
        }

        let mut sets = [FieldSet(0); 5];
        for (i, raw) in fields.iter().enumerate() {
            let (name, min, max) = FIELDS[i];
            sets[i] = parse_field(raw, name, min, max)
                .map_err(|e| Error::Config(format!("invalid cron {expr:?}: {e}")))?;
        }

        Ok(Self {
            minutes: sets[0],
            hours: sets[1],
            days_of_month: sets[2],
            months: sets[3],
            days_of_week: sets[4],
        })
    }

    /// All five fields must match (day-of-month and day-of-week are both
    /// conjunctive).
    fn matches_local(&self, dt: &NaiveDateTime) -> bool {
        self.minutes.contains(dt.minute())
            && self.hours.contains(dt.hour())
            && self.days_of_month.contains(dt.day())
            && self.months.contains(dt.month())
            && self.days_of_week.contains(dt.weekday().num_days_from_sunday())
    }

    /// Next occurrence strictly after `after`, evaluated in `tz`. Returns
    /// `None` when no minute within the next year matches (e.g. February
    /// 31st).
    pub fn next_after(&self, after: DateTime<Utc>, tz: Tz) -> Option<DateTime<Utc>> {
        let local_after = after.with_timezone(&tz).naive_local();

        // Advance to the next whole minute strictly after `after`.
        let to_next_minute = 60 - i64::from(local_after.second());
        let mut candidate = local_after + chrono::Duration::seconds(to_next_minute);
        candidate = candidate.with_second(0).unwrap_or(candidate);
        candidate = candidate.with_nanosecond(0).unwrap_or(candidate);

        for _ in 0..MAX_CHECKS {
            if self.matches_local(&candidate) {
                match tz.from_local_datetime(&candidate) {
                    LocalResult::Single(dt) => return Some(dt.with_timezone(&Utc)),
                    LocalResult::Ambiguous(earliest, _) => {
                        return Some(earliest.with_timezone(&Utc));
                    }
                    // Spring-forward gap: this local minute does not exist.
                    LocalResult::None => {}
                }
            }
            candidate += chrono::Duration::minutes(1);
        }
        None
    }
}

fn parse_field(raw: &str, name: &str, min: u32, max: u32) -> std::result::Result<FieldSet, String> {
    let mut mask = 0u64;
    for part in raw.split(',') {
        for value in expand_part(part, name, min, max)? {
            mask |= 1 << value;
        }
    }
    Ok(FieldSet(mask))
}

/// Expand one comma-separated list item into its admitted values.
fn expand_part(part: &str, name: &str, min: u32, max: u32) -> std::result::Result<Vec<u32>, String> {
    let (range, step) = match part.split_once('/') {
        Some((range, step_raw)) => {
            if range != "*" && !range.contains('-') {
                return Err(format!("{name}: step requires '*' or a range, got {part:?}"));
            }
            (range, parse_step(step_raw, name)?)
        }
        None => (part, 1),
    };

    let (start, end) = if range == "*" {
        (min, max)
    } else if let Some((start_raw, end_raw)) = range.split_once('-') {
        let start = parse_value(start_raw, name, min, max)?;
        let end = parse_value(end_raw, name, min, max)?;
        if start > end {
            return Err(format!("{name}: range start {start} > end {end}"));
        }
        (start, end)
    } else {
        let value = parse_value(range, name, min, max)?;
        (value, value)
    };

    Ok((start..=end).step_by(step as usize).collect())
}

fn parse_value(raw: &str, name: &str, min: u32, max: u32) -> std::result::Result<u32, String> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("{name}: invalid value {raw:?}"));
    }
    let value: u32 = raw
        .parse()
        .map_err(|_| format!("{name}: invalid value {raw:?}"))?;
    if value < min || value > max {
        return Err(format!("{name}: value {value} out of range {min}..={max}"));
    }
    Ok(value)
}

fn parse_step(raw: &str, name: &str) -> std::result::Result<u32, String> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("{name}: invalid step {raw:?}"));
    }
    let step: u32 = raw
        .parse()
        .map_err(|_| format!("{name}: invalid step {raw:?}"))?;
    if step == 0 {
        return Err(format!("{name}: step must be >= 1"));
    }
    Ok(step)
}
