//! Non-seasonal ARIMA backend.

use crate::core::{Forecast, Grid, TimeSeries};
use crate::error::{Result, TagcastError};
use crate::models::arima::diff::{difference, integrate};
use crate::models::{FittedModel, Forecaster};
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};
use crate::utils::stats::{interval_z, residual_sigma};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// AR and MA coefficients are kept inside the stationary/invertible region.
const COEFFICIENT_BOUNDS: (f64, f64) = (-0.99, 0.99);

/// ARIMA model order.
///
/// In TOML: `arima_order = { p = 2, d = 1, q = 0 }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArimaOrder {
    /// AR order
    pub p: usize,
    /// Differencing order
    pub d: usize,
    /// MA order
    pub q: usize,
}

impl ArimaOrder {
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }

    /// Estimated parameters: AR + MA + intercept.
    pub fn num_params(&self) -> usize {
        self.p + self.q + 1
    }

    /// Shortest series that leaves two differenced values after the lags.
    pub fn min_len(&self) -> usize {
        self.d + self.p.max(self.q) + 2
    }
}

impl Default for ArimaOrder {
    fn default() -> Self {
        Self::new(1, 1, 1)
    }
}

/// ARIMA forecaster.
///
/// The series is differenced `d` times, an ARMA(p, q) with intercept is
/// fitted to the result by minimising the conditional sum of squares, and
/// forecasts are integrated back to the original scale.
#[derive(Debug, Clone)]
pub struct Arima {
    order: ArimaOrder,
    level: f64,
}

impl Arima {
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self::from_order(ArimaOrder::new(p, d, q))
    }

    pub fn from_order(order: ArimaOrder) -> Self {
        Self { order, level: 0.8 }
    }

    /// Set the prediction interval coverage.
    pub fn with_level(mut self, level: f64) -> Self {
        self.level = level;
        self
    }

    pub fn order(&self) -> ArimaOrder {
        self.order
    }

    /// Fit and return the concrete model.
    pub fn fit_model(&self, series: &TimeSeries) -> Result<ArimaFit> {
        let ArimaOrder { p, d, q } = self.order;
        let values = series.values();
        let min_len = self.order.min_len();
        if values.len() < min_len {
            return Err(TagcastError::InsufficientData {
                needed: min_len,
                got: values.len(),
            });
        }
        let z = interval_z(self.level)?;
        let grid = series.grid()?;

        let differenced = difference(values, d);
        let params = estimate(&differenced, p, q);
        if !params.is_finite() {
            return Err(TagcastError::ComputationError(
                "arima estimation produced non-finite parameters".to_string(),
            ));
        }
        debug!(
            series = series.label().unwrap_or_default(),
            intercept = params.intercept,
            ar = ?params.ar,
            ma = ?params.ma,
            "arima parameters estimated"
        );

        let start = p.max(q);
        let innovations = params.innovations(&differenced);
        // Δ^d y[t] sits at differenced[t - d], so the one-step error carries
        // over to the original scale unchanged.
        let fitted: Vec<f64> = (0..values.len())
            .map(|t| {
                if t < d + start {
                    f64::NAN
                } else {
                    values[t] - innovations[t - d]
                }
            })
            .collect();
        let residuals: Vec<f64> = values
            .iter()
            .zip(&fitted)
            .map(|(y, f)| y - f)
            .collect();

        let effective = &innovations[start..];
        let variance = effective.iter().map(|e| e * e).sum::<f64>() / effective.len() as f64;
        let n_eff = effective.len() as f64;
        let k = self.order.num_params() as f64;
        let log_likelihood =
            -0.5 * n_eff * (1.0 + variance.ln() + (2.0 * std::f64::consts::PI).ln());

        Ok(ArimaFit {
            grid,
            order: self.order,
            params,
            original: values.to_vec(),
            differenced,
            innovations,
            sigma: residual_sigma(&residuals),
            fitted,
            residuals,
            z,
            aic: -2.0 * log_likelihood + 2.0 * k,
            bic: -2.0 * log_likelihood + k * n_eff.ln(),
        })
    }
}

impl Default for Arima {
    fn default() -> Self {
        Self::from_order(ArimaOrder::default())
    }
}

impl Forecaster for Arima {
    fn fit(&self, series: &TimeSeries) -> Result<Box<dyn FittedModel>> {
        Ok(Box::new(self.fit_model(series)?))
    }

    fn name(&self) -> &str {
        "ARIMA"
    }
}

#[derive(Debug, Clone)]
struct ArmaParams {
    intercept: f64,
    ar: Vec<f64>,
    ma: Vec<f64>,
}

impl ArmaParams {
    fn from_point(point: &[f64], p: usize) -> Self {
        Self {
            intercept: point[0],
            ar: point[1..1 + p].to_vec(),
            ma: point[1 + p..].to_vec(),
        }
    }

    fn is_finite(&self) -> bool {
        self.intercept.is_finite() && self.ar.iter().chain(&self.ma).all(|c| c.is_finite())
    }

    /// Prediction for index `t` given the values and errors before it.
    fn step(&self, series: &[f64], errors: &[f64], t: usize) -> f64 {
        let ar: f64 = self
            .ar
            .iter()
            .enumerate()
            .filter(|(i, _)| t > *i)
            .map(|(i, phi)| phi * (series[t - 1 - i] - self.intercept))
            .sum();
        let ma: f64 = self
            .ma
            .iter()
            .enumerate()
            .filter(|(i, _)| t > *i)
            .map(|(i, theta)| theta * errors[t - 1 - i])
            .sum();
        self.intercept + ar + ma
    }

    /// One-step errors over `series`; zero before the first full lag window.
    fn innovations(&self, series: &[f64]) -> Vec<f64> {
        let start = self.ar.len().max(self.ma.len());
        let mut errors = vec![0.0; series.len()];
        for t in start..series.len() {
            errors[t] = series[t] - self.step(series, &errors, t);
        }
        errors
    }

    fn css(&self, series: &[f64]) -> f64 {
        let start = self.ar.len().max(self.ma.len());
        self.innovations(series)[start..].iter().map(|e| e * e).sum()
    }
}

fn estimate(differenced: &[f64], p: usize, q: usize) -> ArmaParams {
    let mean = differenced.iter().sum::<f64>() / differenced.len() as f64;
    if p == 0 && q == 0 {
        return ArmaParams {
            intercept: mean,
            ar: vec![],
            ma: vec![],
        };
    }

    let mut initial = vec![mean];
    initial.extend((0..p).map(|i| 0.1 / (i + 1) as f64));
    initial.extend((0..q).map(|i| 0.1 / (i + 1) as f64));

    let mut bounds = vec![(f64::NEG_INFINITY, f64::INFINITY)];
    bounds.resize(1 + p + q, COEFFICIENT_BOUNDS);

    let result = nelder_mead(
        |point| ArmaParams::from_point(point, p).css(differenced),
        &initial,
        Some(&bounds),
        NelderMeadConfig::default(),
    );
    debug!(
        css = result.optimal_value,
        iterations = result.iterations,
        converged = result.converged,
        "arima optimiser finished"
    );
    ArmaParams::from_point(&result.optimal_point, p)
}

/// An ARIMA model fitted to one series.
#[derive(Debug, Clone)]
pub struct ArimaFit {
    grid: Grid,
    order: ArimaOrder,
    params: ArmaParams,
    original: Vec<f64>,
    differenced: Vec<f64>,
    innovations: Vec<f64>,
    fitted: Vec<f64>,
    residuals: Vec<f64>,
    z: f64,
    sigma: f64,
    aic: f64,
    bic: f64,
}

impl ArimaFit {
    pub fn order(&self) -> ArimaOrder {
        self.order
    }

    pub fn intercept(&self) -> f64 {
        self.params.intercept
    }

    pub fn ar_coefficients(&self) -> &[f64] {
        &self.params.ar
    }

    pub fn ma_coefficients(&self) -> &[f64] {
        &self.params.ma
    }

    pub fn aic(&self) -> f64 {
        self.aic
    }

    pub fn bic(&self) -> f64 {
        self.bic
    }

    /// Root mean square one-step error.
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Point forecasts for the next `steps` positions after the data.
    fn forecast_path(&self, steps: usize) -> Vec<f64> {
        let mut series = self.differenced.clone();
        let mut errors = self.innovations.clone();
        for _ in 0..steps {
            let t = series.len();
            series.push(self.params.step(&series, &errors, t));
            // future shocks have zero expectation
            errors.push(0.0);
        }
        integrate(&series[self.differenced.len()..], &self.original, self.order.d)
    }
}

impl FittedModel for ArimaFit {
    fn predict(&self, timestamps: &[DateTime<Utc>]) -> Result<Forecast> {
        let n = self.grid.len();
        let positions = timestamps
            .iter()
            .map(|&ts| self.grid.position(ts))
            .collect::<Result<Vec<_>>>()?;
        let steps = positions
            .iter()
            .filter(|&&p| p >= n)
            .map(|p| p - n + 1)
            .max()
            .unwrap_or(0);
        let path = self.forecast_path(steps);

        let mut point = Vec::with_capacity(timestamps.len());
        let mut lower = Vec::with_capacity(timestamps.len());
        let mut upper = Vec::with_capacity(timestamps.len());
        for position in positions {
            let (p, h) = if position < n {
                (self.fitted[position], 1)
            } else {
                let h = position - n + 1;
                (path[h - 1], h)
            };
            let half = self.z * self.sigma * (h as f64).sqrt();
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
        "ARIMA"
    }
}
