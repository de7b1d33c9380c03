//! Weekly calendar anchored to a fixed weekday.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// The weekday every calendar week is bucketed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeekAnchor(Weekday);

impl WeekAnchor {
    pub fn new(weekday: Weekday) -> Self {
        Self(weekday)
    }

    pub fn weekday(&self) -> Weekday {
        self.0
    }

    /// Map a date to the anchor weekday on or before it.
    ///
    /// `None` when that weekday falls before the earliest representable date.
    pub fn anchor(&self, date: NaiveDate) -> Option<NaiveDate> {
        let back = (date.weekday().num_days_from_monday() + 7 - self.0.num_days_from_monday()) % 7;
        date.checked_sub_signed(Duration::days(i64::from(back)))
    }

    pub fn is_anchored(&self, date: NaiveDate) -> bool {
        date.weekday() == self.0
    }
}

impl Default for WeekAnchor {
    fn default() -> Self {
        Self(Weekday::Mon)
    }
}

/// Every anchored week from a first to a last week, inclusive, 7 days apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Calendar {
    start: Option<NaiveDate>,
    len: usize,
}

impl Calendar {
    /// The calendar of an empty dataset.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of weeks from `first` to `last` inclusive, whatever their order.
    pub fn span(first: NaiveDate, last: NaiveDate) -> usize {
        ((last - first).num_days().unsigned_abs() / 7) as usize + 1
    }

    /// Calendar spanning two anchored weeks. Order of the bounds is ignored.
    pub fn spanning(first: NaiveDate, last: NaiveDate) -> Self {
        let (first, last) = if first <= last {
            (first, last)
        } else {
            (last, first)
        };
        Self {
            start: Some(first),
            len: Self::span(first, last),
        }
    }

    /// Calendar covering the global minimum and maximum of `weeks`.
    pub fn covering(weeks: impl IntoIterator<Item = NaiveDate>) -> Self {
        let mut bounds: Option<(NaiveDate, NaiveDate)> = None;
        for week in weeks {
            bounds = Some(match bounds {
                None => (week, week),
                Some((lo, hi)) => (lo.min(week), hi.max(week)),
            });
        }
        match bounds {
            Some((lo, hi)) => Self::spanning(lo, hi),
            None => Self::empty(),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn start(&self) -> Option<NaiveDate> {
        self.start
    }

    pub fn end(&self) -> Option<NaiveDate> {
        let last = self.len.checked_sub(1)?;
        self.week(last)
    }

    /// The `index`-th week, if within the calendar.
    pub fn week(&self, index: usize) -> Option<NaiveDate> {
        if index >= self.len {
            return None;
        }
        self.start?.checked_add_signed(Duration::weeks(index as i64))
    }

    /// Position of an anchored week in the calendar.
    pub fn index_of(&self, week: NaiveDate) -> Option<usize> {
        let start = self.start?;
        let days = (week - start).num_days();
        if days < 0 || days % 7 != 0 {
            return None;
        }
        let index = (days / 7) as usize;
        (index < self.len).then_some(index)
    }

    pub fn weeks(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        (0..self.len).filter_map(move |i| self.week(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn anchor_floors_to_weekday() {
        let monday = WeekAnchor::default();
        // 2020-01-06 is a Monday
        assert_eq!(monday.anchor(date(2020, 1, 6)), Some(date(2020, 1, 6)));
        assert_eq!(monday.anchor(date(2020, 1, 8)), Some(date(2020, 1, 6)));
        assert_eq!(monday.anchor(date(2020, 1, 12)), Some(date(2020, 1, 6)));
        assert_eq!(monday.anchor(date(2020, 1, 13)), Some(date(2020, 1, 13)));

        let sunday = WeekAnchor::new(Weekday::Sun);
        assert_eq!(sunday.anchor(date(2020, 1, 6)), Some(date(2020, 1, 5)));
        assert_eq!(sunday.anchor(date(2020, 1, 5)), Some(date(2020, 1, 5)));
        assert!(sunday.is_anchored(date(2020, 1, 12)));
        assert!(!sunday.is_anchored(date(2020, 1, 13)));
    }

    #[test]
    fn anchor_crosses_year_boundary() {
        // 2021-01-01 is a Friday; the Monday before is 2020-12-28
        let monday = WeekAnchor::default();
        assert_eq!(monday.anchor(date(2021, 1, 1)), Some(date(2020, 12, 28)));
    }

    #[test]
    fn anchor_at_the_lower_date_limit_is_none() {
        // The day after MIN's weekday is six days back from MIN
        let later = WeekAnchor::new(NaiveDate::MIN.weekday().succ());
        assert_eq!(later.anchor(NaiveDate::MIN), None);
        let anchor = WeekAnchor::new(NaiveDate::MIN.weekday());
        assert_eq!(anchor.anchor(NaiveDate::MIN), Some(NaiveDate::MIN));
    }

    #[test]
    fn span_counts_weeks_inclusively() {
        assert_eq!(Calendar::span(date(2020, 1, 6), date(2020, 1, 6)), 1);
        assert_eq!(Calendar::span(date(2020, 1, 20), date(2020, 1, 6)), 3);
        assert_eq!(Calendar::span(date(1, 1, 1), date(9999, 12, 31)), 521_723);
    }

    #[test]
    fn calendar_spans_inclusive_range() {
        let cal = Calendar::spanning(date(2020, 1, 6), date(2020, 1, 20));
        assert_eq!(cal.len(), 3);
        assert_eq!(cal.start(), Some(date(2020, 1, 6)));
        assert_eq!(cal.end(), Some(date(2020, 1, 20)));
        let weeks: Vec<_> = cal.weeks().collect();
        assert_eq!(
            weeks,
            vec![date(2020, 1, 6), date(2020, 1, 13), date(2020, 1, 20)]
        );
    }

    #[test]
    fn calendar_covering_uses_global_bounds() {
        let cal = Calendar::covering([date(2020, 1, 20), date(2020, 1, 6), date(2020, 1, 13)]);
        assert_eq!(cal.start(), Some(date(2020, 1, 6)));
        assert_eq!(cal.len(), 3);

        let single = Calendar::covering([date(2020, 1, 6)]);
        assert_eq!(single.len(), 1);
        assert_eq!(single.start(), single.end());
    }

    #[test]
    fn empty_calendar_has_no_weeks() {
        let cal = Calendar::covering(std::iter::empty());
        assert!(cal.is_empty());
        assert_eq!(cal.start(), None);
        assert_eq!(cal.end(), None);
        assert_eq!(cal.weeks().count(), 0);
        assert_eq!(cal.index_of(date(2020, 1, 6)), None);
    }

    #[test]
    fn index_of_rejects_off_calendar_dates() {
        let cal = Calendar::spanning(date(2020, 1, 6), date(2020, 1, 20));
        assert_eq!(cal.index_of(date(2020, 1, 13)), Some(1));
        assert_eq!(cal.index_of(date(2020, 1, 14)), None);
        assert_eq!(cal.index_of(date(2019, 12, 30)), None);
        assert_eq!(cal.index_of(date(2020, 1, 27)), None);
        assert_eq!(cal.week(3), None);
    }
}
