//! CSV writers for processed series, forecasts, comparisons and metrics.

use crate::core::{Forecast, TimeSeries};
use crate::error::Result;
use crate::evaluate::Evaluation;
use crate::utils::metrics::AccuracyMetrics;
use chrono::{DateTime, Utc};
use csv::Writer;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// One line of the metrics table.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsRow {
    pub tag: String,
    pub metrics: AccuracyMetrics,
}

impl MetricsRow {
    pub fn new(tag: impl Into<String>, metrics: AccuracyMetrics) -> Self {
        Self {
            tag: tag.into(),
            metrics,
        }
    }
}

#[derive(Serialize)]
struct SeriesRow {
    ds: String,
    /// Display form, so whole counts carry no fractional part.
    y: String,
}

#[derive(Serialize)]
struct ForecastRow {
    timestamp: String,
    yhat: f64,
    yhat_lower: f64,
    yhat_upper: f64,
}

#[derive(Serialize)]
struct ComponentForecastRow {
    timestamp: String,
    yhat: f64,
    yhat_lower: f64,
    yhat_upper: f64,
    trend: f64,
    seasonal: f64,
}

#[derive(Serialize)]
struct ComparisonCsvRow {
    timestamp: String,
    actual: f64,
    predicted: f64,
    lower: f64,
    upper: f64,
}

#[derive(Serialize)]
struct MetricsCsvRow<'a> {
    tag: &'a str,
    #[serde(rename = "MAE")]
    mae: f64,
    #[serde(rename = "RMSE")]
    rmse: f64,
    #[serde(rename = "MAPE")]
    mape: f64,
}

/// File-name-safe form of a tag: `.` and path separators become `_`.
///
/// ```
/// assert_eq!(tagcast::output::file_stem("asp.net"), "asp_net");
/// ```
pub fn file_stem(tag: &str) -> String {
    tag.chars()
        .map(|c| match c {
            '.' | '/' | '\\' => '_',
            c => c,
        })
        .collect()
}

/// Assign every tag a distinct file stem.
///
/// Tags that are already file-name-safe keep their own name. The others get
/// [`file_stem`], with `_2`, `_3`, ... appended when that stem is taken.
/// Stems are compared case-insensitively so no two files can clash on a
/// case-folding filesystem. The result does not depend on input order.
///
/// ```
/// let stems = tagcast::output::file_stems(["asp.net", "asp_net"]);
/// assert_eq!(stems["asp_net"], "asp_net");
/// assert_eq!(stems["asp.net"], "asp_net_2");
/// ```
pub fn file_stems<'a>(tags: impl IntoIterator<Item = &'a str>) -> BTreeMap<String, String> {
    let tags: BTreeSet<&str> = tags.into_iter().collect();
    let mut taken = HashSet::new();
    let mut stems = BTreeMap::new();

    for &tag in tags.iter().filter(|t| file_stem(t) == **t) {
        if taken.insert(tag.to_lowercase()) {
            stems.insert(tag.to_string(), tag.to_string());
        }
    }
    for &tag in &tags {
        if stems.contains_key(tag) {
            continue;
        }
        let base = file_stem(tag);
        let mut stem = base.clone();
        let mut suffix = 1;
        while !taken.insert(stem.to_lowercase()) {
            suffix += 1;
            stem = format!("{base}_{suffix}");
        }
        if stem != base {
            warn!(tag, stem = %stem, "file name already taken, using a suffix");
        }
        stems.insert(tag.to_string(), stem);
    }
    stems
}

fn format_date(timestamp: DateTime<Utc>) -> String {
    timestamp.format(DATE_FORMAT).to_string()
}

fn create_writer(path: &Path) -> Result<Writer<fs::File>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(Writer::from_path(path)?)
}

fn write_rows<T: Serialize>(path: &Path, rows: impl IntoIterator<Item = T>) -> Result<()> {
    let mut writer = create_writer(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    debug!(path = %path.display(), "wrote table");
    Ok(())
}

/// Write a processed `(ds, y)` series to `<dir>/<stem>.csv`.
///
/// `name` goes through [`file_stem`]; pass a stem from [`file_stems`] when
/// several tags share a directory.
pub fn write_series(dir: &Path, name: &str, series: &TimeSeries) -> Result<PathBuf> {
    let path = dir.join(format!("{}.csv", file_stem(name)));
    write_rows(
        &path,
        series.iter().map(|(ts, y)| SeriesRow {
            ds: format_date(ts),
            y: y.to_string(),
        }),
    )?;
    Ok(path)
}

/// Write a forecast to `<dir>/<stem>_forecast.csv`.
///
/// The trend and seasonal columns are present only when the model reports
/// components.
pub fn write_forecast(dir: &Path, name: &str, forecast: &Forecast) -> Result<PathBuf> {
    let path = dir.join(format!("{}_forecast.csv", file_stem(name)));
    if forecast.has_components() {
        write_rows(
            &path,
            forecast.records().map(|r| ComponentForecastRow {
                timestamp: format_date(r.timestamp),
                yhat: r.point,
                yhat_lower: r.lower,
                yhat_upper: r.upper,
                trend: r.trend.unwrap_or(f64::NAN),
                seasonal: r.seasonal.unwrap_or(f64::NAN),
            }),
        )?;
    } else {
        write_rows(
            &path,
            forecast.records().map(|r| ForecastRow {
                timestamp: format_date(r.timestamp),
                yhat: r.point,
                yhat_lower: r.lower,
                yhat_upper: r.upper,
            }),
        )?;
    }
    Ok(path)
}

/// Write a holdout comparison to `<dir>/<stem>_comparison.csv`.
pub fn write_comparison(dir: &Path, name: &str, evaluation: &Evaluation) -> Result<PathBuf> {
    let path = dir.join(format!("{}_comparison.csv", file_stem(name)));
    write_rows(
        &path,
        evaluation.comparison.iter().map(|row| ComparisonCsvRow {
            timestamp: format_date(row.timestamp),
            actual: row.actual,
            predicted: row.predicted,
            lower: row.lower,
            upper: row.upper,
        }),
    )?;
    Ok(path)
}

/// Write the metrics table, one line per tag. Undefined MAPE is written as `NaN`.
pub fn write_metrics(path: &Path, rows: &[MetricsRow]) -> Result<()> {
    if rows.is_empty() {
        // serialize() emits the header with the first row only
        let mut writer = create_writer(path)?;
        writer.write_record(["tag", "MAE", "RMSE", "MAPE"])?;
        writer.flush()?;
        return Ok(());
    }
    write_rows(
        path,
        rows.iter().map(|row| MetricsCsvRow {
            tag: &row.tag,
            mae: row.metrics.mae,
            rmse: row.metrics.rmse,
            mape: row.metrics.mape,
        }),
    )
}
