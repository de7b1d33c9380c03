//! Forecast result structure for holding timestamped predictions.

use crate::error::{Result, TagcastError};
use chrono::{DateTime, Utc};

/// One row of a forecast: point estimate, interval and optional components.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastRecord {
    pub timestamp: DateTime<Utc>,
    pub point: f64,
    pub lower: f64,
    pub upper: f64,
    pub trend: Option<f64>,
    pub seasonal: Option<f64>,
}

/// A forecast result containing point predictions, intervals and, when the
/// backend exposes them, trend and seasonal components.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Forecast {
    timestamps: Vec<DateTime<Utc>>,
    point: Vec<f64>,
    lower: Vec<f64>,
    upper: Vec<f64>,
    trend: Option<Vec<f64>>,
    seasonal: Option<Vec<f64>>,
}

impl Forecast {
    /// Create an empty forecast.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a forecast with prediction intervals.
    pub fn with_intervals(
        timestamps: Vec<DateTime<Utc>>,
        point: Vec<f64>,
        lower: Vec<f64>,
        upper: Vec<f64>,
    ) -> Result<Self> {
        for len in [point.len(), lower.len(), upper.len()] {
            if len != timestamps.len() {
                return Err(TagcastError::DimensionMismatch {
                    expected: timestamps.len(),
                    got: len,
                });
            }
        }
        Ok(Self {
            timestamps,
            point,
            lower,
            upper,
            trend: None,
            seasonal: None,
        })
    }

    /// Attach trend and seasonal decomposition components.
    pub fn with_components(mut self, trend: Vec<f64>, seasonal: Vec<f64>) -> Result<Self> {
        for len in [trend.len(), seasonal.len()] {
            if len != self.timestamps.len() {
                return Err(TagcastError::DimensionMismatch {
                    expected: self.timestamps.len(),
                    got: len,
                });
            }
        }
        self.trend = Some(trend);
        self.seasonal = Some(seasonal);
        Ok(self)
    }

    /// Get the number of forecast points.
    pub fn len(&self) -> usize {
        self.point.len()
    }

    pub fn is_empty(&self) -> bool {
        self.point.is_empty()
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    /// Get point predictions.
    pub fn point(&self) -> &[f64] {
        &self.point
    }

    /// Get lower interval bounds.
    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    /// Get upper interval bounds.
    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    pub fn trend(&self) -> Option<&[f64]> {
        self.trend.as_deref()
    }

    pub fn seasonal(&self) -> Option<&[f64]> {
        self.seasonal.as_deref()
    }

    /// Check if decomposition components are available.
    pub fn has_components(&self) -> bool {
        self.trend.is_some() && self.seasonal.is_some()
    }

    /// Iterate over the forecast row by row.
    pub fn records(&self) -> impl Iterator<Item = ForecastRecord> + '_ {
        (0..self.len()).map(move |i| ForecastRecord {
            timestamp: self.timestamps[i],
            point: self.point[i],
            lower: self.lower[i],
            upper: self.upper[i],
            trend: self.trend.as_ref().map(|t| t[i]),
            seasonal: self.seasonal.as_ref().map(|s| s[i]),
        })
    }
}
