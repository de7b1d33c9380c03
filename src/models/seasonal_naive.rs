//! Seasonal Naive forecasting model.
//!
//! Forecasts by repeating the value from the same season in the previous cycle.

use crate::core::{Forecast, Grid, TimeSeries};
use crate::error::{Result, TagcastError};
use crate::models::{FittedModel, Forecaster};
use crate::utils::stats::{interval_z, residual_sigma};
use chrono::{DateTime, Utc};

/// Seasonal Naive forecaster.
///
/// Each forecast equals the observation one seasonal period earlier, taken
/// from the last observed season.
#[derive(Debug, Clone)]
pub struct SeasonalNaive {
    period: usize,
    level: f64,
}

impl SeasonalNaive {
    /// Create a new SeasonalNaive model with the given seasonal period.
    pub fn new(period: usize) -> Self {
        Self { period, level: 0.8 }
    }

    /// Set the prediction interval coverage.
    pub fn with_level(mut self, level: f64) -> Self {
        self.level = level;
        self
    }

    /// Get the seasonal period.
    pub fn period(&self) -> usize {
        self.period
    }
}

impl Default for SeasonalNaive {
    fn default() -> Self {
        Self::new(52)
    }
}

impl Forecaster for SeasonalNaive {
    fn fit(&self, series: &TimeSeries) -> Result<Box<dyn FittedModel>> {
        if self.period == 0 {
            return Err(TagcastError::InvalidParameter(
                "seasonal period must be positive".to_string(),
            ));
        }
        let values = series.values();
        if values.len() < self.period {
            return Err(TagcastError::InsufficientData {
                needed: self.period,
                got: values.len(),
            });
        }
        let z = interval_z(self.level)?;
        let grid = series.grid()?;

        // y_hat[t] = y[t - period]; undefined for the first season
        let fitted: Vec<f64> = (0..values.len())
            .map(|i| {
                if i < self.period {
                    f64::NAN
                } else {
                    values[i - self.period]
                }
            })
            .collect();
        let residuals: Vec<f64> = values
            .iter()
            .zip(&fitted)
            .map(|(y, f)| y - f)
            .collect();
        let sigma = residual_sigma(&residuals);

        Ok(Box::new(SeasonalNaiveFit {
            grid,
            period: self.period,
            last_season: values[values.len() - self.period..].to_vec(),
            fitted,
            residuals,
            z,
            sigma,
        }))
    }

    fn name(&self) -> &str {
        "SeasonalNaive"
    }
}

/// A Seasonal Naive model fitted to one series.
#[derive(Debug, Clone)]
pub struct SeasonalNaiveFit {
    grid: Grid,
    period: usize,
    last_season: Vec<f64>,
    fitted: Vec<f64>,
    residuals: Vec<f64>,
    z: f64,
    sigma: f64,
}

impl FittedModel for SeasonalNaiveFit {
    fn predict(&self, timestamps: &[DateTime<Utc>]) -> Result<Forecast> {
        let n = self.grid.len();
        let mut point = Vec::with_capacity(timestamps.len());
        let mut lower = Vec::with_capacity(timestamps.len());
        let mut upper = Vec::with_capacity(timestamps.len());

        for &ts in timestamps {
            let position = self.grid.position(ts)?;
            let (p, k) = if position < n {
                (self.fitted[position], 1)
            } else {
                let h = position - n;
                // last_season[0] sits at position n - period
                (self.last_season[(position + self.period - n) % self.period], h / self.period + 1)
            };
            // Standard error grows with the number of complete seasons ahead
            let half = self.z * self.sigma * (k as f64).sqrt();
            point.push(p);
            lower.push(p - half);
            upper.push(p + half);
        }

        Forecast::with_intervals(timestamps.to_vec(), point, lower, upper)
    }

    fn fitted_values(&self) -> &[f64] {
        &self.fitted
    }

    fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    fn name(&self) -> &str {
        "SeasonalNaive"
    }
}
