//! Core data structures for time series forecasting.

mod forecast;
mod time_series;

pub use forecast::{Forecast, ForecastRecord};
pub use time_series::{Grid, TimeSeries};
