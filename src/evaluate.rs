//! Holdout evaluation of a forecasting backend.

use crate::core::TimeSeries;
use crate::error::{Result, TagcastError};
use crate::models::Forecaster;
use crate::utils::metrics::{calculate_metrics, AccuracyMetrics};
use chrono::{DateTime, Utc};

/// Actual against predicted at one holdout timestamp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComparisonRow {
    pub timestamp: DateTime<Utc>,
    pub actual: f64,
    pub predicted: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Result of one holdout evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub metrics: AccuracyMetrics,
    pub comparison: Vec<ComparisonRow>,
    /// Number of periods the model was fitted on.
    pub train_len: usize,
}

/// Withholds the last `holdout` periods, fits on the rest and scores the
/// predictions for the withheld periods.
#[derive(Debug, Clone, Copy)]
pub struct Evaluator {
    holdout: usize,
}

impl Evaluator {
    pub fn new(holdout: usize) -> Self {
        Self { holdout }
    }

    pub fn holdout(&self) -> usize {
        self.holdout
    }

    /// Evaluate `forecaster` on `series`.
    ///
    /// # Example
    /// ```
    /// use tagcast::core::TimeSeries;
    /// use tagcast::evaluate::Evaluator;
    /// use tagcast::models::SeasonalNaive;
    /// use chrono::{Duration, TimeZone, Utc};
    ///
    /// let start = Utc.with_ymd_and_hms(2020, 1, 6, 0, 0, 0).unwrap();
    /// let timestamps = (0..8).map(|i| start + Duration::weeks(i)).collect();
    /// let values = vec![1.0, 2.0, 1.0, 2.0, 1.0, 2.0, 1.0, 2.0];
    /// let series = TimeSeries::univariate(timestamps, values).unwrap();
    ///
    /// let eval = Evaluator::new(2).evaluate(&SeasonalNaive::new(2), &series).unwrap();
    /// assert_eq!(eval.metrics.mae, 0.0);
    /// ```
    pub fn evaluate(&self, forecaster: &dyn Forecaster, series: &TimeSeries) -> Result<Evaluation> {
        if self.holdout == 0 {
            return Err(TagcastError::InvalidParameter(
                "holdout must be at least one period".to_string(),
            ));
        }
        if series.len() <= self.holdout {
            return Err(TagcastError::InsufficientData {
                needed: self.holdout + 1,
                got: series.len(),
            });
        }

        let (train, test) = series.split_tail(self.holdout)?;
        // The training part alone may be too short to infer the step.
        let train = match (train.frequency(), series.step()) {
            (None, Ok(step)) => train.with_frequency(step),
            _ => train,
        };

        let model = forecaster.fit(&train)?;
        let forecast = model.predict(test.timestamps())?;

        let metrics = calculate_metrics(test.values(), forecast.point())?;
        let comparison = forecast
            .records()
            .zip(test.values())
            .map(|(record, &actual)| ComparisonRow {
                timestamp: record.timestamp,
                actual,
                predicted: record.point,
                lower: record.lower,
                upper: record.upper,
            })
            .collect();

        Ok(Evaluation {
            metrics,
            comparison,
            train_len: train.len(),
        })
    }
}
