//! Pipeline configuration.
//!
//! Every field has a default, so an empty TOML document is a valid
//! configuration:
//!
//! ```toml
//! input = "data/raw/tag_question_counts.csv"
//! processed_dir = "data/processed"
//! output_dir = "data/output"
//! count_column = "question_count"
//! anchor = "Mon"
//! holdout = 12
//! horizon = 26
//! seasonal_period = 52
//! interval_level = 0.8
//! model = "holt-winters"
//! arima_order = { p = 1, d = 1, q = 1 }
//! ```

use crate::error::{Result, TagcastError};
use crate::ingest::DEFAULT_COUNT_COLUMN;
use crate::models::{Arima, ArimaOrder, BoxedForecaster, ModelKind};
use crate::resample::WeekAnchor;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings for a preprocessing and forecasting run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Raw weekly counts CSV.
    pub input: PathBuf,
    /// Directory for the per-tag `(ds, y)` files.
    pub processed_dir: PathBuf,
    /// Directory for forecasts, comparisons and the metrics table.
    pub output_dir: PathBuf,
    /// Name of the count column in the input.
    pub count_column: String,
    pub anchor: WeekAnchor,
    /// Trailing weeks withheld for evaluation.
    pub holdout: usize,
    /// Weeks forecast past the end of the data.
    pub horizon: usize,
    pub seasonal_period: usize,
    /// Prediction interval coverage, in (0, 1).
    pub interval_level: f64,
    pub model: ModelKind,
    /// Order used when `model = "arima"`.
    pub arima_order: ArimaOrder,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("data/raw/tag_question_counts.csv"),
            processed_dir: PathBuf::from("data/processed"),
            output_dir: PathBuf::from("data/output"),
            count_column: DEFAULT_COUNT_COLUMN.to_string(),
            anchor: WeekAnchor::default(),
            holdout: 12,
            horizon: 26,
            seasonal_period: 52,
            interval_level: 0.8,
            model: ModelKind::default(),
            arima_order: ArimaOrder::default(),
        }
    }
}

impl PipelineConfig {
    /// Load and validate a configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            TagcastError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml(&contents)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: PipelineConfig =
            toml::from_str(contents).map_err(|e| TagcastError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.holdout == 0 {
            return Err(TagcastError::Config("holdout must be at least 1".into()));
        }
        if self.horizon == 0 {
            return Err(TagcastError::Config("horizon must be at least 1".into()));
        }
        if self.seasonal_period == 0 {
            return Err(TagcastError::Config(
                "seasonal_period must be at least 1".into(),
            ));
        }
        if !(self.interval_level > 0.0 && self.interval_level < 1.0) {
            return Err(TagcastError::Config(format!(
                "interval_level must be in (0, 1), got {}",
                self.interval_level
            )));
        }
        if self.count_column.trim().is_empty() {
            return Err(TagcastError::Config("count_column must not be empty".into()));
        }
        if self.arima_order.d > 2 {
            return Err(TagcastError::Config(format!(
                "arima_order.d must be at most 2, got {}",
                self.arima_order.d
            )));
        }
        Ok(())
    }

    /// The forecaster this configuration selects.
    pub fn forecaster(&self) -> BoxedForecaster {
        match self.model {
            ModelKind::Arima => {
                let arima = Arima::from_order(self.arima_order);
                Box::new(arima.with_level(self.interval_level))
            }
            kind => kind.build(self.seasonal_period, self.interval_level),
        }
    }

    /// Path of the metrics table.
    pub fn metrics_path(&self) -> PathBuf {
        self.output_dir.join("metrics.csv")
    }
}
