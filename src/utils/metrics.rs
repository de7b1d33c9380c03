//! Accuracy metrics for forecast evaluation.

use crate::error::{Result, TagcastError};

/// Accuracy of a forecast over a holdout window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccuracyMetrics {
    /// Mean Absolute Error
    pub mae: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Percentage Error over the non-zero actuals.
    /// NaN when every actual is zero.
    pub mape: f64,
}

impl AccuracyMetrics {
    /// Whether MAPE could be computed.
    pub fn has_mape(&self) -> bool {
        !self.mape.is_nan()
    }
}

/// Calculate accuracy metrics between actual and predicted values.
///
/// # Example
/// ```
/// use tagcast::utils::calculate_metrics;
///
/// let m = calculate_metrics(&[0.0, 0.0], &[1.0, 2.0]).unwrap();
/// assert_eq!(m.mae, 1.5);
/// assert!(m.mape.is_nan());
/// ```
pub fn calculate_metrics(actual: &[f64], predicted: &[f64]) -> Result<AccuracyMetrics> {
    if actual.is_empty() || predicted.is_empty() {
        return Err(TagcastError::EmptyData);
    }

    if actual.len() != predicted.len() {
        return Err(TagcastError::DimensionMismatch {
            expected: actual.len(),
            got: predicted.len(),
        });
    }

    Ok(AccuracyMetrics {
        mae: mae(actual, predicted),
        rmse: rmse(actual, predicted),
        mape: mape(actual, predicted),
    })
}

/// Calculate MAE between two slices.
pub fn mae(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.len() != predicted.len() || actual.is_empty() {
        return f64::NAN;
    }
    actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).abs())
        .sum::<f64>()
        / actual.len() as f64
}

/// Calculate MSE between two slices.
pub fn mse(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.len() != predicted.len() || actual.is_empty() {
        return f64::NAN;
    }
    actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum::<f64>()
        / actual.len() as f64
}

/// Calculate RMSE between two slices.
pub fn rmse(actual: &[f64], predicted: &[f64]) -> f64 {
    mse(actual, predicted).sqrt()
}

/// Calculate MAPE between two slices, in percent.
///
/// Terms whose actual value is zero are undefined and left out of the mean.
/// If no term remains the result is NaN.
pub fn mape(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.len() != predicted.len() {
        return f64::NAN;
    }
    let (sum, count) = actual
        .iter()
        .zip(predicted)
        .filter(|(a, _)| **a != 0.0)
        .fold((0.0, 0usize), |(s, c), (a, p)| {
            (s + ((a - p) / a).abs(), c + 1)
        });
    if count == 0 {
        f64::NAN
    } else {
        100.0 * sum / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn calculate_metrics_perfect_prediction() {
        let actual = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let metrics = calculate_metrics(&actual, &actual).unwrap();

        assert_relative_eq!(metrics.mae, 0.0, epsilon = 1e-10);
        assert_relative_eq!(metrics.rmse, 0.0, epsilon = 1e-10);
        assert_relative_eq!(metrics.mape, 0.0, epsilon = 1e-10);
    }

    #[test]
    fn calculate_metrics_known_values() {
        let actual = vec![1.0, 2.0, 4.0, 5.0];
        let predicted = vec![2.0, 2.0, 2.0, 5.0];
        // Errors: 1, 0, 2, 0

        let metrics = calculate_metrics(&actual, &predicted).unwrap();

        assert_relative_eq!(metrics.mae, 0.75, epsilon = 1e-10);
        assert_relative_eq!(metrics.rmse, (5.0f64 / 4.0).sqrt(), epsilon = 1e-10);
        // (100% + 0% + 50% + 0%) / 4
        assert_relative_eq!(metrics.mape, 37.5, epsilon = 1e-10);
    }

    #[test]
    fn mape_excludes_zero_actuals() {
        let actual = vec![0.0, 10.0, 0.0, 20.0];
        let predicted = vec![5.0, 12.0, 1.0, 15.0];
        // Defined terms: 20% and 25%
        assert_relative_eq!(mape(&actual, &predicted), 22.5, epsilon = 1e-10);

        let metrics = calculate_metrics(&actual, &predicted).unwrap();
        assert!(metrics.has_mape());
        assert!(metrics.mae.is_finite());
    }

    #[test]
    fn mape_all_zero_actuals_is_nan() {
        let metrics = calculate_metrics(&[0.0, 0.0, 0.0], &[1.0, 0.0, 2.0]).unwrap();
        assert!(metrics.mape.is_nan());
        assert!(!metrics.has_mape());
        assert_relative_eq!(metrics.mae, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn calculate_metrics_dimension_mismatch() {
        let result = calculate_metrics(&[1.0, 2.0, 3.0], &[1.0, 2.0]);
        assert!(matches!(
            result,
            Err(TagcastError::DimensionMismatch {
                expected: 3,
                got: 2
            })
        ));
    }

    #[test]
    fn calculate_metrics_empty_data() {
        let result = calculate_metrics(&[], &[]);
        assert!(matches!(result, Err(TagcastError::EmptyData)));
    }

    #[test]
    fn standalone_functions_return_nan_on_bad_input() {
        assert!(mae(&[], &[]).is_nan());
        assert!(rmse(&[1.0], &[1.0, 2.0]).is_nan());
        assert!(mape(&[1.0], &[]).is_nan());
        assert!(mape(&[], &[]).is_nan());
    }

    #[test]
    fn standalone_rmse() {
        assert_relative_eq!(
            rmse(&[1.0, 2.0, 3.0], &[2.0, 3.0, 4.0]),
            1.0,
            epsilon = 1e-10
        );
    }
}
