//! Projection of resampled tag series into `(ds, y)` time series.

use crate::core::TimeSeries;
use crate::error::Result;
use crate::resample::{ResampledTable, TagSeries};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::BTreeMap;

/// Midnight UTC of a calendar date.
pub fn week_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .unwrap_or_default()
}

/// Project one tag series to `(ds, y)`, ascending, labelled with the tag.
pub fn to_series(series: &TagSeries<'_>) -> Result<TimeSeries> {
    let (timestamps, values): (Vec<_>, Vec<_>) = series
        .iter()
        .map(|(week, count)| (week_start(week), count as f64))
        .unzip();

    Ok(TimeSeries::univariate(timestamps, values)?
        .with_label(series.tag())
        .with_frequency(Duration::weeks(1)))
}

/// One `(ds, y)` series per tag, keyed by tag.
pub fn to_series_map(table: &ResampledTable) -> Result<BTreeMap<String, TimeSeries>> {
    table
        .iter_series()
        .map(|series| Ok((series.tag().to_string(), to_series(&series)?)))
        .collect()
}
