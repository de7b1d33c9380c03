//! Differencing and its inverse.

/// Difference `series` `d` times. Each pass shortens it by one value.
pub fn difference(series: &[f64], d: usize) -> Vec<f64> {
    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= 1 {
            break;
        }
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}

/// Undo `d` differences of values that continue `original`.
///
/// `differenced` holds future values at the `d`-th difference level; the
/// result is the matching continuation of `original` itself.
pub fn integrate(differenced: &[f64], original: &[f64], d: usize) -> Vec<f64> {
    let mut result = differenced.to_vec();
    for level in (0..d).rev() {
        let mut running = difference(original, level).last().copied().unwrap_or(0.0);
        for value in &mut result {
            running += *value;
            *value = running;
        }
    }
    result
}
