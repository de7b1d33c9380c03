//! TimeSeries data structure holding a `(ds, y)` sequence.

use crate::error::{Result, TagcastError};
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;

/// A univariate time series with strictly increasing timestamps.
///
/// This is the `(ds, y)` shape consumed by the forecasting backends: `ds`
/// are the timestamps and `y` the observed values.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    timestamps: Vec<DateTime<Utc>>,
    values: Vec<f64>,
    label: Option<String>,
    frequency: Option<Duration>,
}

impl TimeSeries {
    /// Create a series, validating ordering and lengths.
    pub fn univariate(timestamps: Vec<DateTime<Utc>>, values: Vec<f64>) -> Result<Self> {
        // Validate timestamps are strictly increasing
        for i in 1..timestamps.len() {
            if timestamps[i] <= timestamps[i - 1] {
                return Err(TagcastError::TimestampError(
                    "timestamps must be strictly increasing".to_string(),
                ));
            }
        }

        if values.len() != timestamps.len() {
            return Err(TagcastError::DimensionMismatch {
                expected: timestamps.len(),
                got: values.len(),
            });
        }

        Ok(Self {
            timestamps,
            values,
            label: None,
            frequency: None,
        })
    }

    /// Attach a label (the tag the series belongs to).
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Attach a known sampling step.
    pub fn with_frequency(mut self, frequency: Duration) -> Self {
        self.frequency = Some(frequency);
        self
    }

    /// Get the number of observations.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Check if the series is empty.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Get timestamps (`ds`).
    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    /// Get values (`y`).
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn frequency(&self) -> Option<Duration> {
        self.frequency
    }

    /// Iterate over `(ds, y)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (DateTime<Utc>, f64)> + '_ {
        self.timestamps.iter().copied().zip(self.values.iter().copied())
    }

    /// Extract the half-open range `start..end` of the series.
    pub fn slice(&self, start: usize, end: usize) -> Result<TimeSeries> {
        if start > end {
            return Err(TagcastError::InvalidParameter(
                "start must be <= end".to_string(),
            ));
        }
        if end > self.len() {
            return Err(TagcastError::DimensionMismatch {
                expected: self.len(),
                got: end,
            });
        }

        Ok(TimeSeries {
            timestamps: self.timestamps[start..end].to_vec(),
            values: self.values[start..end].to_vec(),
            label: self.label.clone(),
            frequency: self.frequency,
        })
    }

    /// Split off the last `tail` observations, returning `(head, tail)`.
    pub fn split_tail(&self, tail: usize) -> Result<(TimeSeries, TimeSeries)> {
        if tail > self.len() {
            return Err(TagcastError::InsufficientData {
                needed: tail,
                got: self.len(),
            });
        }
        let cut = self.len() - tail;
        Ok((self.slice(0, cut)?, self.slice(cut, self.len())?))
    }

    /// Infer the sampling step as the modal spacing between timestamps.
    ///
    /// `tolerance` is the minimum share of gaps that must agree with the mode.
    pub fn infer_frequency(&self, tolerance: f64) -> Result<Duration> {
        if self.len() < 2 {
            return Err(TagcastError::InsufficientData {
                needed: 2,
                got: self.len(),
            });
        }

        let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
        for w in self.timestamps.windows(2) {
            *counts.entry((w[1] - w[0]).num_seconds()).or_insert(0) += 1;
        }

        let (modal_diff, modal_count) = counts
            .iter()
            .max_by_key(|(_, &count)| count)
            .map(|(&diff, &count)| (diff, count))
            .ok_or_else(|| TagcastError::TimestampError("empty spacing data".to_string()))?;

        let total = self.len() - 1;
        if (modal_count as f64 / total as f64) < tolerance {
            return Err(TagcastError::TimestampError(
                "no unique modal spacing found".to_string(),
            ));
        }

        Ok(Duration::seconds(modal_diff))
    }

    /// The sampling step: the attached frequency, or the inferred one.
    pub fn step(&self) -> Result<Duration> {
        match self.frequency {
            Some(freq) => Ok(freq),
            None => self.infer_frequency(1.0),
        }
    }

    /// The regular grid this series lives on.
    pub fn grid(&self) -> Result<Grid> {
        let start = *self.timestamps.first().ok_or(TagcastError::EmptyData)?;
        let step = self.step()?;
        if step <= Duration::zero() {
            return Err(TagcastError::TimestampError(
                "series step must be positive".to_string(),
            ));
        }
        Ok(Grid {
            start,
            step,
            len: self.len(),
        })
    }

    /// Timestamps of the `horizon` periods following the last observation.
    pub fn future_timestamps(&self, horizon: usize) -> Result<Vec<DateTime<Utc>>> {
        let grid = self.grid()?;
        Ok((grid.len..grid.len + horizon).map(|i| grid.timestamp(i)).collect())
    }
}

/// Regularly spaced positions `start + k * step`, the first `len` of which
/// are observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    start: DateTime<Utc>,
    step: Duration,
    len: usize,
}

impl Grid {
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn step(&self) -> Duration {
        self.step
    }

    /// Number of observed positions.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Timestamp at grid position `index`.
    pub fn timestamp(&self, index: usize) -> DateTime<Utc> {
        self.start + self.step * index as i32
    }

    /// Grid position of `timestamp`. Positions past the observed range are
    /// allowed; they index future periods.
    pub fn position(&self, timestamp: DateTime<Utc>) -> Result<usize> {
        let step = self.step.num_seconds();
        let offset = (timestamp - self.start).num_seconds();
        if step <= 0 || offset < 0 || offset % step != 0 {
            return Err(TagcastError::TimestampError(format!(
                "{timestamp} is not on the series grid starting at {}",
                self.start
            )));
        }
        Ok((offset / step) as usize)
    }
}
