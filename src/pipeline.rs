//! End-to-end batch flow: load, resample, evaluate, forecast and write.

use crate::adapter::to_series_map;
use crate::config::PipelineConfig;
use crate::core::TimeSeries;
use crate::error::{Result, TagcastError};
use crate::evaluate::Evaluator;
use crate::ingest::ObservationSource;
use crate::models::Forecaster;
use crate::output::{
    file_stems, write_comparison, write_forecast, write_metrics, write_series, MetricsRow,
};
use crate::resample::WeeklyResampler;
use crate::runner::ForecastRunner;
use crate::utils::metrics::AccuracyMetrics;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{info, warn};

/// What preprocessing produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreprocessSummary {
    pub raw_rows: usize,
    pub tags: usize,
    pub calendar_weeks: usize,
    /// Tag-weeks with no observation, written as zero.
    pub filled_weeks: usize,
    pub duplicates_dropped: usize,
    pub files: Vec<PathBuf>,
}

/// A tag that evaluated and forecast successfully.
#[derive(Debug, Clone, PartialEq)]
pub struct TagReport {
    pub tag: String,
    pub metrics: AccuracyMetrics,
    pub forecast_path: PathBuf,
    pub comparison_path: PathBuf,
}

/// A tag whose model failed. Other tags are unaffected.
#[derive(Debug, Clone, PartialEq)]
pub struct TagFailure {
    pub tag: String,
    pub error: TagcastError,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    pub preprocess: PreprocessSummary,
    pub model: String,
    pub succeeded: Vec<TagReport>,
    pub failed: Vec<TagFailure>,
    pub metrics_path: PathBuf,
}

impl PipelineReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Load, resample and write one `(ds, y)` file per tag.
pub fn preprocess(
    config: &PipelineConfig,
    source: &dyn ObservationSource,
) -> Result<PreprocessSummary> {
    prepare(config, source).map(|prepared| prepared.summary)
}

struct Prepared {
    summary: PreprocessSummary,
    series: BTreeMap<String, TimeSeries>,
    /// Unique file stem per tag.
    stems: BTreeMap<String, String>,
}

fn prepare(config: &PipelineConfig, source: &dyn ObservationSource) -> Result<Prepared> {
    config.validate()?;
    info!(source = %source.describe(), "loading observations");
    let records = source.load()?;

    let table = WeeklyResampler::new(config.anchor).resample_records(&records)?;
    let series = to_series_map(&table)?;
    let stems = file_stems(series.keys().map(String::as_str));

    let mut files = Vec::with_capacity(series.len());
    for (tag, ts) in &series {
        files.push(write_series(&config.processed_dir, stem_of(&stems, tag), ts)?);
    }

    let summary = PreprocessSummary {
        raw_rows: records.len(),
        tags: table.tags().len(),
        calendar_weeks: table.calendar().len(),
        filled_weeks: table.filled_weeks(),
        duplicates_dropped: table.duplicates_dropped(),
        files,
    };
    info!(
        raw_rows = summary.raw_rows,
        tags = summary.tags,
        weeks = summary.calendar_weeks,
        filled = summary.filled_weeks,
        duplicates = summary.duplicates_dropped,
        dir = %config.processed_dir.display(),
        "preprocessing complete"
    );
    Ok(Prepared {
        summary,
        series,
        stems,
    })
}

fn stem_of<'a>(stems: &'a BTreeMap<String, String>, tag: &'a str) -> &'a str {
    stems.get(tag).map_or(tag, String::as_str)
}

/// Preprocess, then evaluate and forecast every tag in ascending order.
///
/// Input errors abort the run. A tag whose model fails is recorded in the
/// report; files already written for other tags are kept and the remaining
/// tags still run. The metrics table lists the successful tags.
pub fn run(
    config: &PipelineConfig,
    source: &dyn ObservationSource,
    forecaster: &dyn Forecaster,
) -> Result<PipelineReport> {
    let Prepared {
        summary: preprocess,
        series,
        stems,
    } = prepare(config, source)?;

    let evaluator = Evaluator::new(config.holdout);
    let runner = ForecastRunner::new(config.horizon);
    let mut succeeded = Vec::new();
    let mut failed = Vec::new();

    for (tag, ts) in &series {
        let stem = stem_of(&stems, tag);
        match process_tag(config, &evaluator, &runner, forecaster, tag, stem, ts) {
            Ok(report) => {
                info!(
                    tag = %tag,
                    mae = report.metrics.mae,
                    rmse = report.metrics.rmse,
                    mape = report.metrics.mape,
                    "tag forecast"
                );
                succeeded.push(report);
            }
            Err(error) => {
                warn!(tag = %tag, error = %error, "tag failed");
                failed.push(TagFailure {
                    tag: tag.clone(),
                    error,
                });
            }
        }
    }

    let rows: Vec<MetricsRow> = succeeded
        .iter()
        .map(|r| MetricsRow::new(r.tag.clone(), r.metrics))
        .collect();
    let metrics_path = config.metrics_path();
    write_metrics(&metrics_path, &rows)?;

    info!(
        model = forecaster.name(),
        succeeded = succeeded.len(),
        failed = failed.len(),
        metrics = %metrics_path.display(),
        "run complete"
    );

    Ok(PipelineReport {
        preprocess,
        model: forecaster.name().to_string(),
        succeeded,
        failed,
        metrics_path,
    })
}

fn process_tag(
    config: &PipelineConfig,
    evaluator: &Evaluator,
    runner: &ForecastRunner,
    forecaster: &dyn Forecaster,
    tag: &str,
    stem: &str,
    series: &TimeSeries,
) -> Result<TagReport> {
    let evaluation = evaluator.evaluate(forecaster, series)?;
    let forecast = runner.run(forecaster, series)?;

    let forecast_path = write_forecast(&config.output_dir, stem, &forecast)?;
    let comparison_path = write_comparison(&config.output_dir, stem, &evaluation)?;

    Ok(TagReport {
        tag: tag.to_string(),
        metrics: evaluation.metrics,
        forecast_path,
        comparison_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::MemorySource;
    use crate::models::SeasonalNaive;
    use std::path::Path;

    fn config_in(root: &Path) -> PipelineConfig {
        PipelineConfig {
            processed_dir: root.join("processed"),
            output_dir: root.join("output"),
            holdout: 2,
            horizon: 3,
            seasonal_period: 2,
            ..PipelineConfig::default()
        }
    }

    fn weekly_rows(tag: &'static str, n: usize) -> Vec<(String, &'static str, String)> {
        let start = chrono::NaiveDate::from_ymd_opt(2020, 1, 6).unwrap();
        (0..n)
            .map(|i| {
                let week = start + chrono::Duration::weeks(i as i64);
                (week.to_string(), tag, (10 + i % 2).to_string())
            })
            .collect()
    }

    fn source(rows: &[(String, &str, String)]) -> MemorySource {
        MemorySource::from_rows(rows.iter().map(|(w, t, c)| (w.as_str(), *t, c.as_str())))
    }

    #[test]
    fn preprocess_zero_fills_and_writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let src = MemorySource::from_rows([
            ("2020-01-06", "python", "10"),
            ("2020-01-20", "python", "5"),
            ("2020-01-13", "rust", "2"),
            ("2020-01-13", "rust", "9"),
        ]);

        let summary = preprocess(&config, &src).unwrap();
        assert_eq!(summary.raw_rows, 4);
        assert_eq!(summary.tags, 2);
        assert_eq!(summary.calendar_weeks, 3);
        assert_eq!(summary.filled_weeks, 3);
        assert_eq!(summary.duplicates_dropped, 1);
        assert!(config.processed_dir.join("python.csv").exists());
        assert!(config.processed_dir.join("rust.csv").exists());
    }

    #[test]
    fn tags_sharing_a_file_stem_keep_separate_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let src = MemorySource::from_rows([
            ("2020-01-06", "asp.net", "10"),
            ("2020-01-06", "asp_net", "99"),
        ]);

        let summary = preprocess(&config, &src).unwrap();
        assert_eq!(summary.files.len(), 2);
        assert_ne!(summary.files[0], summary.files[1]);

        let read = |name: &str| std::fs::read_to_string(config.processed_dir.join(name)).unwrap();
        assert_eq!(read("asp_net.csv"), "ds,y\n2020-01-06,99\n");
        assert_eq!(read("asp_net_2.csv"), "ds,y\n2020-01-06,10\n");
    }

    #[test]
    fn colliding_tags_get_their_own_forecasts() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let mut rows = weekly_rows("c.sharp", 8);
        rows.extend(weekly_rows("c_sharp", 8));

        let report = run(&config, &source(&rows), &SeasonalNaive::new(2)).unwrap();
        assert!(report.is_complete());
        let paths: Vec<_> = report.succeeded.iter().map(|r| &r.forecast_path).collect();
        assert_eq!(
            paths,
            vec![
                &config.output_dir.join("c_sharp_2_forecast.csv"),
                &config.output_dir.join("c_sharp_forecast.csv"),
            ]
        );
    }

    #[test]
    fn run_writes_forecasts_comparisons_and_metrics() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let mut rows = weekly_rows("python", 8);
        rows.extend(weekly_rows("asp.net", 8));

        let report = run(&config, &source(&rows), &SeasonalNaive::new(2)).unwrap();
        assert!(report.is_complete());
        assert_eq!(report.model, "SeasonalNaive");
        let tags: Vec<&str> = report.succeeded.iter().map(|r| r.tag.as_str()).collect();
        assert_eq!(tags, vec!["asp.net", "python"]);

        assert!(config.output_dir.join("asp_net_forecast.csv").exists());
        assert!(config.output_dir.join("python_comparison.csv").exists());
        let metrics = std::fs::read_to_string(&report.metrics_path).unwrap();
        assert_eq!(metrics.lines().count(), 3);
        // Alternating pattern is captured exactly by a period-2 naive model
        assert_eq!(report.succeeded[0].metrics.mae, 0.0);
    }

    /// Delegates to a seasonal naive model except for one tag.
    struct FailsOn(&'static str);

    impl Forecaster for FailsOn {
        fn fit(&self, series: &TimeSeries) -> Result<Box<dyn crate::models::FittedModel>> {
            if series.label() == Some(self.0) {
                return Err(TagcastError::ComputationError("diverged".into()));
            }
            SeasonalNaive::new(2).fit(series)
        }

        fn name(&self) -> &str {
            "FailsOn"
        }
    }

    #[test]
    fn failing_tag_does_not_stop_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let mut rows = weekly_rows("go", 8);
        rows.extend(weekly_rows("julia", 8));
        rows.extend(weekly_rows("rust", 8));

        let report = run(&config, &source(&rows), &FailsOn("julia")).unwrap();
        assert!(!report.is_complete());
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].tag, "julia");
        assert!(matches!(
            report.failed[0].error,
            TagcastError::ComputationError(_)
        ));

        let tags: Vec<&str> = report.succeeded.iter().map(|r| r.tag.as_str()).collect();
        assert_eq!(tags, vec!["go", "rust"]);
        assert!(config.output_dir.join("go_forecast.csv").exists());
        assert!(config.output_dir.join("rust_forecast.csv").exists());
        assert!(!config.output_dir.join("julia_forecast.csv").exists());

        let metrics = std::fs::read_to_string(&report.metrics_path).unwrap();
        assert_eq!(metrics.lines().count(), 3);
        assert!(!metrics.contains("julia"));
    }

    #[test]
    fn insufficient_history_fails_every_tag() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let rows = weekly_rows("python", 8);

        // Six training weeks cannot fill a seven-week season
        let report = run(&config, &source(&rows), &SeasonalNaive::new(7)).unwrap();
        assert!(report.succeeded.is_empty());
        assert!(matches!(
            report.failed[0].error,
            TagcastError::InsufficientData { .. }
        ));
        let metrics = std::fs::read_to_string(&report.metrics_path).unwrap();
        assert_eq!(metrics.trim(), "tag,MAE,RMSE,MAPE");
    }

    #[test]
    fn invalid_input_aborts_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let src = MemorySource::from_rows([
            ("2020-01-06", "python", "10"),
            ("2020-01-13", "python", "-3"),
        ]);
        let result = run(&config, &src, &SeasonalNaive::new(2));
        assert!(matches!(result, Err(TagcastError::InvalidRow { row: 2, .. })));
        assert!(!config.metrics_path().exists());
    }
}
