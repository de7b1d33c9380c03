//! # tagcast
//!
//! Weekly activity forecasting for question tags.
//!
//! Raw `(week, tag, count)` rows are validated, bucketed to anchored weeks,
//! zero-filled over one global calendar and projected to `(ds, y)` series.
//! Each series is then evaluated on a trailing holdout and forecast with a
//! seasonal model behind the [`models::Forecaster`] trait.
//!
//! ```
//! use tagcast::ingest::MemorySource;
//! use tagcast::prelude::*;
//!
//! let source = MemorySource::from_rows([
//!     ("2020-01-06", "python", "10"),
//!     ("2020-01-20", "python", "5"),
//! ]);
//! let records = source.load().unwrap();
//! let table = WeeklyResampler::default().resample_records(&records).unwrap();
//! assert_eq!(table.series("python").unwrap().counts(), &[10, 0, 5]);
//! ```

pub mod adapter;
pub mod config;
pub mod core;
pub mod error;
pub mod evaluate;
pub mod ingest;
pub mod models;
pub mod output;
pub mod pipeline;
pub mod resample;
pub mod runner;
pub mod utils;

pub use error::{Result, TagcastError};

pub mod prelude {
    pub use crate::config::PipelineConfig;
    pub use crate::core::{Forecast, TimeSeries};
    pub use crate::error::{Result, TagcastError};
    pub use crate::evaluate::{Evaluation, Evaluator};
    pub use crate::ingest::{CsvSource, ObservationSource};
    pub use crate::models::{Arima, FittedModel, Forecaster, HoltWinters, SeasonalNaive};
    pub use crate::resample::{WeekAnchor, WeeklyResampler};
    pub use crate::runner::ForecastRunner;
    pub use crate::utils::{calculate_metrics, AccuracyMetrics};
}
