//! Raw rows and validated observations.

use crate::error::{Result, TagcastError};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

/// Column holding the week date.
pub const WEEK_COLUMN: &str = "week";
/// Column holding the tag name.
pub const TAG_COLUMN: &str = "tag";
/// Default column holding the weekly count.
pub const DEFAULT_COUNT_COLUMN: &str = "question_count";

/// Earliest year `parse_week` accepts.
pub const MIN_YEAR: i32 = 1;
/// Latest year `parse_week` accepts.
pub const MAX_YEAR: i32 = 9999;

/// A row exactly as read from a source, before any interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// 1-based line of the row in its source. CSV header is line 1.
    pub row: usize,
    pub week: String,
    pub tag: String,
    pub count: String,
    /// Name of the count column, used in validation messages.
    pub count_column: String,
}

impl RawRecord {
    pub fn new(
        row: usize,
        week: impl Into<String>,
        tag: impl Into<String>,
        count: impl Into<String>,
    ) -> Self {
        Self {
            row,
            week: week.into(),
            tag: tag.into(),
            count: count.into(),
            count_column: DEFAULT_COUNT_COLUMN.to_string(),
        }
    }

    pub fn with_count_column(mut self, column: impl Into<String>) -> Self {
        self.count_column = column.into();
        self
    }

    /// Interpret the row, rejecting anything that is not a date, a tag and
    /// a non-negative integer count.
    pub fn validate(&self) -> Result<Observation> {
        let week = parse_week(&self.week).ok_or_else(|| {
            self.invalid(
                WEEK_COLUMN,
                format!("`{}` is not a recognised date", self.week),
            )
        })?;

        let tag = self.tag.trim();
        if tag.is_empty() {
            return Err(self.invalid(TAG_COLUMN, "tag is empty".to_string()));
        }

        let count = parse_count(&self.count).ok_or_else(|| {
            self.invalid(
                &self.count_column,
                format!("`{}` is not a non-negative integer", self.count),
            )
        })?;

        Ok(Observation {
            week,
            tag: tag.to_string(),
            count,
        })
    }

    pub(crate) fn invalid(&self, column: &str, reason: String) -> TagcastError {
        TagcastError::InvalidRow {
            row: self.row,
            column: column.to_string(),
            reason,
        }
    }
}

/// A validated `(week, tag, count)` triple.
///
/// `week` is the raw date; it is bucketed to the anchor weekday by the
/// resampler.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Observation {
    pub week: NaiveDate,
    pub tag: String,
    pub count: u64,
}

impl Observation {
    pub fn new(week: NaiveDate, tag: impl Into<String>, count: u64) -> Self {
        Self {
            week,
            tag: tag.into(),
            count,
        }
    }
}

/// Parse a week value into a calendar date.
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` (optionally suffixed with
/// ` UTC`, as warehouse exports write it), `YYYY-MM-DDTHH:MM:SS` and
/// RFC 3339. Offsets are converted to UTC before the time is dropped.
/// Only four-digit years are accepted.
pub fn parse_week(text: &str) -> Option<NaiveDate> {
    parse_date(text).filter(|date| (MIN_YEAR..=MAX_YEAR).contains(&date.year()))
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    let text = text.strip_suffix(" UTC").unwrap_or(text);

    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date);
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt.date());
        }
    }
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.naive_utc().date())
}

/// Parse a count as a plain base-10 unsigned integer.
///
/// Signs, decimal points, exponents and blanks are all rejected.
pub fn parse_count(text: &str) -> Option<u64> {
    let text = text.trim();
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}
