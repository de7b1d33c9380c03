//! Fit a backend and forecast over history plus a future horizon.

use crate::core::{Forecast, TimeSeries};
use crate::error::{Result, TagcastError};
use crate::models::Forecaster;
use tracing::debug;

/// Produces full-range forecasts: every historical period followed by
/// `horizon` future periods on the series' own weekly grid.
#[derive(Debug, Clone, Copy)]
pub struct ForecastRunner {
    horizon: usize,
}

impl ForecastRunner {
    pub fn new(horizon: usize) -> Self {
        Self { horizon }
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// Fit `forecaster` on `series` and predict across history and horizon.
    pub fn run(&self, forecaster: &dyn Forecaster, series: &TimeSeries) -> Result<Forecast> {
        if series.is_empty() {
            return Err(TagcastError::EmptyData);
        }
        let model = forecaster.fit(series)?;

        let mut timestamps = series.timestamps().to_vec();
        timestamps.extend(series.future_timestamps(self.horizon)?);
        debug!(
            series = series.label().unwrap_or_default(),
            model = model.name(),
            points = timestamps.len(),
            "forecasting"
        );

        model.predict(&timestamps)
    }
}
