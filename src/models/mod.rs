//! Forecasting models.

pub mod arima;
mod holt_winters;
mod seasonal_naive;
mod traits;

pub use arima::{Arima, ArimaFit, ArimaOrder};
pub use holt_winters::{HoltWinters, HoltWintersFit, Smoothing};
pub use seasonal_naive::{SeasonalNaive, SeasonalNaiveFit};
pub use traits::{BoxedForecaster, FittedModel, Forecaster, ModelKind};
