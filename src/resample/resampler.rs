//! Gap-filling weekly resampler.
//!
//! Turns a sparse `(week, tag, count)` table into one zero-filled series per
//! tag over a single calendar shared by every tag.
//!
//! # Example
//!
//! ```
//! use tagcast::ingest::Observation;
//! use tagcast::resample::{WeekAnchor, WeeklyResampler};
//! use chrono::NaiveDate;
//!
//! let d = |day| NaiveDate::from_ymd_opt(2020, 1, day).unwrap();
//! let raw = vec![
//!     Observation::new(d(6), "python", 10),
//!     Observation::new(d(20), "python", 5),
//! ];
//!
//! let table = WeeklyResampler::new(WeekAnchor::default()).resample(&raw).unwrap();
//! assert_eq!(table.calendar().len(), 3);
//! assert_eq!(table.series("python").unwrap().counts(), &[10, 0, 5]);
//! ```

use crate::error::{Result, TagcastError};
use crate::ingest::{Observation, RawRecord, WEEK_COLUMN};
use crate::resample::calendar::{Calendar, WeekAnchor};
use chrono::NaiveDate;
use tracing::{debug, warn};

/// One row of the resampled table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResampledRow<'a> {
    pub week: NaiveDate,
    pub tag: &'a str,
    pub count: u64,
}

/// A tag's complete series over the shared calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagSeries<'a> {
    tag: &'a str,
    calendar: &'a Calendar,
    counts: &'a [u64],
}

impl<'a> TagSeries<'a> {
    pub fn tag(&self) -> &'a str {
        self.tag
    }

    pub fn calendar(&self) -> &'a Calendar {
        self.calendar
    }

    pub fn counts(&self) -> &'a [u64] {
        self.counts
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// `(week, count)` pairs in calendar order.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, u64)> + 'a {
        self.calendar.weeks().zip(self.counts.iter().copied())
    }
}

/// All tag series concatenated, ordered by `(tag, week)` with tags ascending.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResampledTable {
    calendar: Calendar,
    tags: Vec<String>,
    /// Tag-major: `counts[t * calendar.len() + w]`.
    counts: Vec<u64>,
    observed: usize,
    duplicates_dropped: usize,
}

impl ResampledTable {
    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    /// Distinct tags in ascending order.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Number of rows; always `tags × calendar weeks`.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Rows synthesized with a zero count.
    pub fn filled_weeks(&self) -> usize {
        self.len() - self.observed
    }

    /// Input rows discarded as duplicates of an earlier `(week, tag)`.
    pub fn duplicates_dropped(&self) -> usize {
        self.duplicates_dropped
    }

    /// Look up a tag's series.
    pub fn series(&self, tag: &str) -> Option<TagSeries<'_>> {
        let idx = self
            .tags
            .binary_search_by(|t| t.as_str().cmp(tag))
            .ok()?;
        Some(self.series_at(idx))
    }

    /// Every tag's series, in tag order.
    pub fn iter_series(&self) -> impl Iterator<Item = TagSeries<'_>> + '_ {
        (0..self.tags.len()).map(move |i| self.series_at(i))
    }

    /// Every row, ordered by `(tag, week)`.
    pub fn rows(&self) -> impl Iterator<Item = ResampledRow<'_>> + '_ {
        self.iter_series().flat_map(|series| {
            series.iter().map(move |(week, count)| ResampledRow {
                week,
                tag: series.tag(),
                count,
            })
        })
    }

    fn series_at(&self, idx: usize) -> TagSeries<'_> {
        let width = self.calendar.len();
        TagSeries {
            tag: &self.tags[idx],
            calendar: &self.calendar,
            counts: &self.counts[idx * width..(idx + 1) * width],
        }
    }
}

/// Longest calendar a resampler builds by default, about two centuries.
pub const MAX_CALENDAR_WEEKS: usize = 52 * 200;

/// Buckets observations to anchored weeks and fills every gap with zero.
#[derive(Debug, Clone, Copy)]
pub struct WeeklyResampler {
    anchor: WeekAnchor,
    max_weeks: usize,
}

impl Default for WeeklyResampler {
    fn default() -> Self {
        Self::new(WeekAnchor::default())
    }
}

impl WeeklyResampler {
    pub fn new(anchor: WeekAnchor) -> Self {
        Self {
            anchor,
            max_weeks: MAX_CALENDAR_WEEKS,
        }
    }

    /// Cap the calendar length; wider inputs are rejected before any
    /// zero-filled table is allocated.
    pub fn with_max_weeks(mut self, max_weeks: usize) -> Self {
        self.max_weeks = max_weeks;
        self
    }

    pub fn anchor(&self) -> WeekAnchor {
        self.anchor
    }

    pub fn max_weeks(&self) -> usize {
        self.max_weeks
    }

    /// Validate raw rows, then resample them.
    ///
    /// The first row that fails validation aborts the call; nothing is
    /// coerced.
    pub fn resample_records(&self, records: &[RawRecord]) -> Result<ResampledTable> {
        let observations = records
            .iter()
            .map(|record| {
                let observation = record.validate()?;
                match self.anchor.anchor(observation.week) {
                    Some(_) => Ok(observation),
                    None => Err(record.invalid(
                        WEEK_COLUMN,
                        format!("`{}` has no anchored week", record.week),
                    )),
                }
            })
            .collect::<Result<Vec<_>>>()?;
        self.resample(&observations)
    }

    /// Resample validated observations.
    ///
    /// Rows sharing an anchored `(week, tag)` keep the first occurrence in
    /// input order; the rest are dropped and counted. Fails when a week
    /// cannot be anchored or the calendar would exceed the week cap.
    pub fn resample(&self, observations: &[Observation]) -> Result<ResampledTable> {
        let mut keyed: Vec<(&str, NaiveDate, u64)> = observations
            .iter()
            .map(|o| {
                self.anchor
                    .anchor(o.week)
                    .map(|week| (o.tag.as_str(), week, o.count))
                    .ok_or_else(|| {
                        TagcastError::TimestampError(format!("{} has no anchored week", o.week))
                    })
            })
            .collect::<Result<_>>()?;
        // Stable: equal keys stay in input order.
        keyed.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

        let before = keyed.len();
        keyed.dedup_by(|later, earlier| later.0 == earlier.0 && later.1 == earlier.1);
        let duplicates_dropped = before - keyed.len();
        if duplicates_dropped > 0 {
            warn!(
                dropped = duplicates_dropped,
                "duplicate (week, tag) rows dropped, first occurrence kept"
            );
        }

        let calendar = Calendar::covering(keyed.iter().map(|k| k.1));
        if calendar.len() > self.max_weeks {
            return Err(TagcastError::CalendarTooLong {
                weeks: calendar.len(),
                max: self.max_weeks,
            });
        }
        debug!(
            start = ?calendar.start(),
            end = ?calendar.end(),
            weeks = calendar.len(),
            "computed calendar"
        );

        let width = calendar.len();
        let mut tags: Vec<String> = Vec::new();
        let mut counts: Vec<u64> = Vec::new();
        for &(tag, week, count) in &keyed {
            if tags.last().map(String::as_str) != Some(tag) {
                tags.push(tag.to_string());
                counts.resize(tags.len() * width, 0);
            }
            // Every anchored week lies inside the covering calendar.
            if let Some(w) = calendar.index_of(week) {
                counts[(tags.len() - 1) * width + w] = count;
            }
        }

        Ok(ResampledTable {
            calendar,
            tags,
            counts,
            observed: keyed.len(),
            duplicates_dropped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Weekday};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn obs(week: NaiveDate, tag: &str, count: u64) -> Observation {
        Observation::new(week, tag, count)
    }

    fn monday() -> WeeklyResampler {
        WeeklyResampler::new(WeekAnchor::default())
    }

    #[test]
    fn fills_internal_gap_with_zero() {
        let raw = vec![
            obs(date(2020, 1, 6), "python", 10),
            obs(date(2020, 1, 20), "python", 5),
        ];
        let table = monday().resample(&raw).unwrap();

        let weeks: Vec<_> = table.calendar().weeks().collect();
        assert_eq!(
            weeks,
            vec![date(2020, 1, 6), date(2020, 1, 13), date(2020, 1, 20)]
        );
        assert_eq!(table.series("python").unwrap().counts(), &[10, 0, 5]);
        assert_eq!(table.filled_weeks(), 1);
    }

    #[test]
    fn calendar_is_global_across_tags() {
        let raw = vec![
            obs(date(2020, 1, 6), "a", 1),
            obs(date(2020, 2, 3), "a", 5),
            obs(date(2020, 1, 20), "b", 3),
            obs(date(2020, 1, 27), "b", 4),
        ];
        let table = monday().resample(&raw).unwrap();

        assert_eq!(table.calendar().len(), 5);
        assert_eq!(table.series("a").unwrap().counts(), &[1, 0, 0, 0, 5]);
        // Zero-filled on both ends, not only internally
        assert_eq!(table.series("b").unwrap().counts(), &[0, 0, 3, 4, 0]);
        assert_eq!(table.len(), 2 * 5);
    }

    #[test]
    fn single_observation_tag_gets_full_calendar() {
        let raw = vec![
            obs(date(2020, 1, 6), "a", 1),
            obs(date(2020, 1, 27), "a", 1),
            obs(date(2020, 1, 13), "lonely", 9),
        ];
        let table = monday().resample(&raw).unwrap();
        assert_eq!(table.series("lonely").unwrap().counts(), &[0, 9, 0, 0]);
    }

    #[test]
    fn empty_input_yields_empty_table() {
        let table = monday().resample(&[]).unwrap();
        assert!(table.is_empty());
        assert!(table.calendar().is_empty());
        assert!(table.tags().is_empty());
        assert_eq!(table.rows().count(), 0);
        assert_eq!(table.filled_weeks(), 0);
    }

    #[test]
    fn dates_are_bucketed_to_anchor() {
        // Wednesday and the following Tuesday land in consecutive weeks
        let raw = vec![
            obs(date(2020, 1, 8), "go", 2),
            obs(date(2020, 1, 14), "go", 3),
        ];
        let table = monday().resample(&raw).unwrap();
        assert_eq!(table.calendar().start(), Some(date(2020, 1, 6)));
        assert_eq!(table.series("go").unwrap().counts(), &[2, 3]);

        let sunday = WeeklyResampler::new(WeekAnchor::new(Weekday::Sun)).resample(&raw).unwrap();
        assert_eq!(sunday.calendar().start(), Some(date(2020, 1, 5)));
        assert_eq!(sunday.calendar().len(), 2);
    }

    #[test]
    fn duplicates_keep_first_occurrence() {
        let raw = vec![
            obs(date(2020, 1, 6), "rust", 7),
            obs(date(2020, 1, 13), "rust", 1),
            obs(date(2020, 1, 6), "rust", 99),
            // Same anchored week as the first row
            obs(date(2020, 1, 9), "rust", 50),
        ];
        let table = monday().resample(&raw).unwrap();
        assert_eq!(table.series("rust").unwrap().counts(), &[7, 1]);
        assert_eq!(table.duplicates_dropped(), 2);
        assert_eq!(table.filled_weeks(), 0);
    }

    #[test]
    fn rows_are_ordered_by_tag_then_week() {
        let raw = vec![
            obs(date(2020, 1, 13), "zig", 1),
            obs(date(2020, 1, 6), "ada", 2),
        ];
        let table = monday().resample(&raw).unwrap();
        let rows: Vec<_> = table.rows().map(|r| (r.tag, r.week, r.count)).collect();
        assert_eq!(
            rows,
            vec![
                ("ada", date(2020, 1, 6), 2),
                ("ada", date(2020, 1, 13), 0),
                ("zig", date(2020, 1, 6), 0),
                ("zig", date(2020, 1, 13), 1),
            ]
        );
        assert_eq!(table.tags(), &["ada".to_string(), "zig".to_string()]);
        assert!(table.series("missing").is_none());
    }

    #[test]
    fn resample_records_rejects_bad_counts() {
        let records = vec![
            RawRecord::new(1, "2020-01-06", "python", "10"),
            RawRecord::new(2, "2020-01-13", "python", "3.5"),
        ];
        let err = monday().resample_records(&records).unwrap_err();
        assert_eq!(
            err,
            TagcastError::InvalidRow {
                row: 2,
                column: "question_count".to_string(),
                reason: "`3.5` is not a non-negative integer".to_string(),
            }
        );
    }

    #[test]
    fn resample_records_accepts_valid_rows() {
        let records = vec![
            RawRecord::new(1, "2020-01-06", "python", "10"),
            RawRecord::new(2, "2020-01-20 00:00:00 UTC", "python", "5"),
        ];
        let table = monday().resample_records(&records).unwrap();
        assert_eq!(table.series("python").unwrap().counts(), &[10, 0, 5]);
    }

    #[test]
    fn tag_series_reports_totals() {
        let raw = vec![
            obs(date(2020, 1, 6), "a", 4),
            obs(date(2020, 1, 20), "a", 6),
        ];
        let table = monday().resample(&raw).unwrap();
        let series = table.series("a").unwrap();
        assert_eq!(series.total(), 10);
        assert_eq!(series.len(), 3);
        assert_eq!(series.iter().nth(1), Some((date(2020, 1, 13), 0)));
    }

    #[test]
    fn unanchorable_week_is_an_input_error() {
        let anchor = WeekAnchor::new(NaiveDate::MIN.weekday().succ());
        let raw = vec![obs(NaiveDate::MIN, "x", 1)];
        assert!(matches!(
            WeeklyResampler::new(anchor).resample(&raw),
            Err(TagcastError::TimestampError(_))
        ));
    }

    #[test]
    fn out_of_range_record_names_its_row() {
        let records = vec![
            RawRecord::new(2, "2020-01-06", "x", "1"),
            RawRecord::new(3, NaiveDate::MIN.to_string(), "x", "1"),
        ];
        assert!(matches!(
            monday().resample_records(&records),
            Err(TagcastError::InvalidRow { row: 3, ref column, .. }) if column == "week"
        ));
    }

    #[test]
    fn overly_wide_calendar_is_rejected_before_allocation() {
        let records = vec![
            RawRecord::new(2, "0001-01-01", "a", "1"),
            RawRecord::new(3, "9999-12-27", "b", "1"),
        ];
        let err = monday().resample_records(&records).unwrap_err();
        assert!(matches!(
            err,
            TagcastError::CalendarTooLong { weeks, max: MAX_CALENDAR_WEEKS } if weeks > 500_000
        ));

        let raw = vec![
            obs(date(2020, 1, 6), "a", 1),
            obs(date(2020, 3, 2), "a", 1),
        ];
        assert!(monday().with_max_weeks(9).resample(&raw).is_ok());
        assert_eq!(
            monday().with_max_weeks(8).resample(&raw).unwrap_err(),
            TagcastError::CalendarTooLong { weeks: 9, max: 8 }
        );
    }
}
