//! Capability traits separating model fitting from prediction.

use crate::core::{Forecast, TimeSeries};
use crate::error::Result;
use crate::models::{Arima, HoltWinters, SeasonalNaive};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A forecasting backend: turns a training series into a fitted model.
///
/// Fitting never mutates the backend, so one instance serves every tag.
/// The trait is object-safe and used as `&dyn Forecaster`.
pub trait Forecaster {
    /// Fit the model to the time series data.
    fn fit(&self, series: &TimeSeries) -> Result<Box<dyn FittedModel>>;

    /// Get the model name.
    fn name(&self) -> &str;
}

/// A model fitted to one series.
pub trait FittedModel {
    /// Predict at arbitrary timestamps on the training grid.
    ///
    /// Positions inside the training range yield in-sample fitted values,
    /// later positions yield forecasts.
    fn predict(&self, timestamps: &[DateTime<Utc>]) -> Result<Forecast>;

    /// Get the fitted values (in-sample predictions).
    fn fitted_values(&self) -> &[f64];

    /// Get the residuals (actual - fitted).
    fn residuals(&self) -> &[f64];

    /// Get the model name.
    fn name(&self) -> &str;
}

/// Type alias for boxed forecaster trait objects.
///
/// # Example
///
/// ```
/// use tagcast::models::{BoxedForecaster, ModelKind};
///
/// let model: BoxedForecaster = ModelKind::SeasonalNaive.build(52, 0.8);
/// assert_eq!(model.name(), "SeasonalNaive");
/// ```
pub type BoxedForecaster = Box<dyn Forecaster>;

/// The backends selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelKind {
    /// Additive Holt-Winters with estimated smoothing parameters.
    #[default]
    HoltWinters,
    /// Last season repeated.
    SeasonalNaive,
    /// ARIMA(1, 1, 1); the seasonal period is not used.
    Arima,
}

impl ModelKind {
    /// Create the backend for a seasonal period and interval level.
    pub fn build(self, seasonal_period: usize, level: f64) -> BoxedForecaster {
        match self {
            ModelKind::HoltWinters => {
                Box::new(HoltWinters::auto(seasonal_period).with_level(level))
            }
            ModelKind::SeasonalNaive => {
                Box::new(SeasonalNaive::new(seasonal_period).with_level(level))
            }
            ModelKind::Arima => Box::new(Arima::default().with_level(level)),
        }
    }
}
