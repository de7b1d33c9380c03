//! Statistical helpers for prediction intervals.

use crate::error::{Result, TagcastError};
use statrs::distribution::{ContinuousCDF, Normal};

/// Two-sided standard normal critical value for a coverage `level`.
///
/// ```
/// use tagcast::utils::interval_z;
///
/// let z = interval_z(0.95).unwrap();
/// assert!((z - 1.96).abs() < 0.01);
/// ```
pub fn interval_z(level: f64) -> Result<f64> {
    if !(level > 0.0 && level < 1.0) {
        return Err(TagcastError::InvalidParameter(format!(
            "interval level must be in (0, 1), got {level}"
        )));
    }
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| TagcastError::ComputationError(e.to_string()))?;
    Ok(normal.inverse_cdf((1.0 + level) / 2.0))
}

/// Root mean square of the finite residuals; 0 when there are none.
pub fn residual_sigma(residuals: &[f64]) -> f64 {
    let (sum, count) = residuals
        .iter()
        .filter(|r| r.is_finite())
        .fold((0.0, 0usize), |(s, c), r| (s + r * r, c + 1));
    if count == 0 {
        0.0
    } else {
        (sum / count as f64).sqrt()
    }
}
