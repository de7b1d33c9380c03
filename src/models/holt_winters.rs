//! Holt-Winters forecasting model.
//!
//! Also known as triple exponential smoothing, this model handles
//! data with both trend and seasonality. Weekly tag counts use it with a
//! yearly (52-week) additive season.

use crate::core::{Forecast, Grid, TimeSeries};
use crate::error::{Result, TagcastError};
use crate::models::{FittedModel, Forecaster};
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};
use crate::utils::stats::{interval_z, residual_sigma};
use chrono::{DateTime, Utc};
use tracing::debug;

const PARAM_BOUNDS: (f64, f64) = (0.0001, 0.9999);

/// Smoothing parameters `(alpha, beta, gamma)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Smoothing {
    /// Level smoothing parameter (0 < alpha < 1).
    pub alpha: f64,
    /// Trend smoothing parameter (0 < beta < 1).
    pub beta: f64,
    /// Seasonal smoothing parameter (0 < gamma < 1).
    pub gamma: f64,
}

impl Smoothing {
    fn clamped(alpha: f64, beta: f64, gamma: f64) -> Self {
        let (lo, hi) = PARAM_BOUNDS;
        Self {
            alpha: alpha.clamp(lo, hi),
            beta: beta.clamp(lo, hi),
            gamma: gamma.clamp(lo, hi),
        }
    }
}

/// Additive Holt-Winters forecaster.
///
/// The model equations:
/// - Level: `l_t = α(y_t - s_{t-m}) + (1-α)(l_{t-1} + b_{t-1})`
/// - Trend: `b_t = β(l_t - l_{t-1}) + (1-β)b_{t-1}`
/// - Seasonal: `s_t = γ(y_t - l_t) + (1-γ)s_{t-m}`
/// - Forecast: `ŷ_{t+h} = l_t + h*b_t + s_{t+h-m}`
#[derive(Debug, Clone)]
pub struct HoltWinters {
    /// Fixed parameters; `None` means estimate them on every fit.
    smoothing: Option<Smoothing>,
    seasonal_period: usize,
    /// Prediction interval coverage.
    level: f64,
}

impl HoltWinters {
    /// Create a model with fixed smoothing parameters.
    pub fn new(alpha: f64, beta: f64, gamma: f64, seasonal_period: usize) -> Self {
        Self {
            smoothing: Some(Smoothing::clamped(alpha, beta, gamma)),
            seasonal_period,
            level: 0.8,
        }
    }

    /// Create a model whose parameters are estimated by minimising
    /// in-sample squared error.
    pub fn auto(seasonal_period: usize) -> Self {
        Self {
            smoothing: None,
            seasonal_period,
            level: 0.8,
        }
    }

    /// Set the prediction interval coverage.
    pub fn with_level(mut self, level: f64) -> Self {
        self.level = level;
        self
    }

    /// Get the seasonal period.
    pub fn seasonal_period(&self) -> usize {
        self.seasonal_period
    }

    /// Get the fixed smoothing parameters, if any.
    pub fn smoothing(&self) -> Option<Smoothing> {
        self.smoothing
    }

    fn estimate(values: &[f64], period: usize) -> Smoothing {
        let config = NelderMeadConfig {
            max_iter: 1000,
            tolerance: 1e-8,
            ..Default::default()
        };
        let result = nelder_mead(
            |p| smooth(values, Smoothing::clamped(p[0], p[1], p[2]), period).sse,
            &[0.3, 0.1, 0.1],
            Some(&[PARAM_BOUNDS, PARAM_BOUNDS, PARAM_BOUNDS]),
            config,
        );
        let p = &result.optimal_point;
        Smoothing::clamped(p[0], p[1], p[2])
    }
}

impl Default for HoltWinters {
    fn default() -> Self {
        Self::auto(52)
    }
}

impl Forecaster for HoltWinters {
    fn fit(&self, series: &TimeSeries) -> Result<Box<dyn FittedModel>> {
        let period = self.seasonal_period;
        if period == 0 {
            return Err(TagcastError::InvalidParameter(
                "seasonal period must be positive".to_string(),
            ));
        }
        let values = series.values();
        if values.len() < 2 * period {
            return Err(TagcastError::InsufficientData {
                needed: 2 * period,
                got: values.len(),
            });
        }
        let z = interval_z(self.level)?;
        let grid = series.grid()?;

        let smoothing = match self.smoothing {
            Some(fixed) => fixed,
            None => Self::estimate(values, period),
        };
        debug!(
            series = series.label().unwrap_or_default(),
            alpha = smoothing.alpha,
            beta = smoothing.beta,
            gamma = smoothing.gamma,
            "fitted holt-winters"
        );

        let pass = smooth(values, smoothing, period);
        if !pass.level.is_finite() || !pass.trend.is_finite() {
            return Err(TagcastError::ComputationError(
                "holt-winters state diverged".to_string(),
            ));
        }
        let sigma = residual_sigma(&pass.residuals[period..]);

        Ok(Box::new(HoltWintersFit {
            grid,
            smoothing,
            period,
            z,
            sigma,
            pass,
        }))
    }

    fn name(&self) -> &str {
        "HoltWinters"
    }
}

/// State and in-sample paths produced by one smoothing pass.
#[derive(Debug, Clone)]
struct SmoothingPass {
    level: f64,
    trend: f64,
    /// Seasonal indices after the last update, indexed by `t % period`.
    seasonals: Vec<f64>,
    fitted: Vec<f64>,
    residuals: Vec<f64>,
    trend_path: Vec<f64>,
    seasonal_path: Vec<f64>,
    sse: f64,
}

/// Initialise from the first seasons and run the update equations.
///
/// The first season seeds the state and is echoed as its own fit.
fn smooth(values: &[f64], params: Smoothing, period: usize) -> SmoothingPass {
    let n = values.len();
    let Smoothing { alpha, beta, gamma } = params;

    // Initial level: average of first season
    let mut level = values[..period].iter().sum::<f64>() / period as f64;

    // Initial trend: average of seasonal differences when two seasons exist
    let mut trend = if n >= 2 * period {
        (0..period)
            .map(|i| (values[period + i] - values[i]) / period as f64)
            .sum::<f64>()
            / period as f64
    } else {
        0.0
    };

    // Initial seasonal indices, normalised to sum to zero
    let mut seasonals: Vec<f64> = values[..period].iter().map(|y| y - level).collect();
    let mean_season = seasonals.iter().sum::<f64>() / period as f64;
    for s in seasonals.iter_mut() {
        *s -= mean_season;
    }

    let mut fitted = Vec::with_capacity(n);
    let mut residuals = Vec::with_capacity(n);
    let mut trend_path = Vec::with_capacity(n);
    let mut seasonal_path = Vec::with_capacity(n);
    for &y in &values[..period] {
        fitted.push(y);
        residuals.push(0.0);
        trend_path.push(level);
        seasonal_path.push(y - level);
    }

    let mut sse = 0.0;
    for (t, &y) in values.iter().enumerate().skip(period) {
        let idx = t % period;
        let s = seasonals[idx];
        let forecast = level + trend + s;
        let error = y - forecast;
        sse += error * error;

        fitted.push(forecast);
        residuals.push(error);
        trend_path.push(level + trend);
        seasonal_path.push(s);

        let level_prev = level;
        level = alpha * (y - s) + (1.0 - alpha) * (level_prev + trend);
        trend = beta * (level - level_prev) + (1.0 - beta) * trend;
        seasonals[idx] = gamma * (y - level) + (1.0 - gamma) * s;
    }

    SmoothingPass {
        level,
        trend,
        seasonals,
        fitted,
        residuals,
        trend_path,
        seasonal_path,
        sse,
    }
}

/// A Holt-Winters model fitted to one series.
#[derive(Debug, Clone)]
pub struct HoltWintersFit {
    grid: Grid,
    smoothing: Smoothing,
    period: usize,
    z: f64,
    sigma: f64,
    pass: SmoothingPass,
}

impl HoltWintersFit {
    pub fn smoothing(&self) -> Smoothing {
        self.smoothing
    }

    /// Seasonal indices after the last observation.
    pub fn seasonals(&self) -> &[f64] {
        &self.pass.seasonals
    }

    /// `(point, half-width, trend, seasonal)` at a grid position.
    fn at(&self, position: usize) -> (f64, f64, f64, f64) {
        let n = self.grid.len();
        if position < n {
            return (
                self.pass.fitted[position],
                self.z * self.sigma,
                self.pass.trend_path[position],
                self.pass.seasonal_path[position],
            );
        }
        let h = position - n + 1;
        let trend = self.pass.level + h as f64 * self.pass.trend;
        let seasonal = self.pass.seasonals[position % self.period];
        // Uncertainty grows with the number of seasons ahead
        let k = (h - 1) / self.period + 1;
        let half = self.z * self.sigma * (k as f64).sqrt();
        (trend + seasonal, half, trend, seasonal)
    }
}

impl FittedModel for HoltWintersFit {
    fn predict(&self, timestamps: &[DateTime<Utc>]) -> Result<Forecast> {
        let mut point = Vec::with_capacity(timestamps.len());
        let mut lower = Vec::with_capacity(timestamps.len());
        let mut upper = Vec::with_capacity(timestamps.len());
        let mut trend = Vec::with_capacity(timestamps.len());
        let mut seasonal = Vec::with_capacity(timestamps.len());

        for &ts in timestamps {
            let (p, half, t, s) = self.at(self.grid.position(ts)?);
            point.push(p);
            lower.push(p - half);
            upper.push(p + half);
            trend.push(t);
            seasonal.push(s);
        }

        Forecast::with_intervals(timestamps.to_vec(), point, lower, upper)?
            .with_components(trend, seasonal)
    }

    fn fitted_values(&self) -> &[f64] {
        &self.pass.fitted
    }

    fn residuals(&self) -> &[f64] {
        &self.pass.residuals
    }

    fn name(&self) -> &str {
        "HoltWinters"
    }
}
