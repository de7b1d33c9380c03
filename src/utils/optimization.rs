//! Bounded Nelder-Mead minimisation used to estimate smoothing parameters.

/// Reflection coefficient.
const REFLECT: f64 = 1.0;
/// Expansion coefficient.
const EXPAND: f64 = 2.0;
/// Contraction coefficient.
const CONTRACT: f64 = 0.5;
/// Shrink coefficient.
const SHRINK: f64 = 0.5;

/// Result of a Nelder-Mead run.
#[derive(Debug, Clone)]
pub struct NelderMeadResult {
    /// The best point found.
    pub optimal_point: Vec<f64>,
    /// The objective value at that point.
    pub optimal_value: f64,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Whether the simplex converged before `max_iter`.
    pub converged: bool,
}

/// Configuration for Nelder-Mead.
#[derive(Debug, Clone, Copy)]
pub struct NelderMeadConfig {
    pub max_iter: usize,
    /// Stop once the spread of objective values drops below this.
    pub tolerance: f64,
    /// Initial simplex step, relative to the starting coordinate.
    pub initial_step: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            tolerance: 1e-8,
            initial_step: 0.05,
        }
    }
}

/// Minimise `objective` starting from `initial`, keeping every coordinate
/// inside `bounds` (one `(min, max)` pair per dimension) when given.
///
/// # Example
/// ```
/// use tagcast::utils::optimization::{nelder_mead, NelderMeadConfig};
///
/// let result = nelder_mead(
///     |x| (x[0] - 0.3).powi(2) + (x[1] - 0.7).powi(2),
///     &[0.5, 0.5],
///     Some(&[(0.0, 1.0), (0.0, 1.0)]),
///     NelderMeadConfig::default(),
/// );
/// assert!((result.optimal_point[0] - 0.3).abs() < 1e-3);
/// assert!((result.optimal_point[1] - 0.7).abs() < 1e-3);
/// ```
pub fn nelder_mead<F>(
    objective: F,
    initial: &[f64],
    bounds: Option<&[(f64, f64)]>,
    config: NelderMeadConfig,
) -> NelderMeadResult
where
    F: Fn(&[f64]) -> f64,
{
    let n = initial.len();
    if n == 0 {
        return NelderMeadResult {
            optimal_point: vec![],
            optimal_value: f64::NAN,
            iterations: 0,
            converged: false,
        };
    }

    let clamp = |point: Vec<f64>| -> Vec<f64> {
        match bounds {
            None => point,
            Some(b) => point
                .into_iter()
                .enumerate()
                .map(|(i, x)| b.get(i).map_or(x, |&(lo, hi)| x.clamp(lo, hi)))
                .collect(),
        }
    };
    let score = |point: &[f64]| {
        let value = objective(point);
        if value.is_nan() {
            f64::INFINITY
        } else {
            value
        }
    };

    let mut vertices: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
    vertices.push(clamp(initial.to_vec()));
    for i in 0..n {
        let mut vertex = initial.to_vec();
        vertex[i] += if initial[i].abs() > 1e-10 {
            config.initial_step * initial[i].abs()
        } else {
            config.initial_step
        };
        vertices.push(clamp(vertex));
    }
    let mut values: Vec<f64> = vertices.iter().map(|v| score(v)).collect();

    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iter {
        iterations += 1;

        // Order vertices best to worst.
        let mut order: Vec<usize> = (0..=n).collect();
        order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
        let (best, worst, second_worst) = (order[0], order[n], order[n - 1]);

        if (values[worst] - values[best]).abs() < config.tolerance {
            converged = true;
            break;
        }

        let centroid: Vec<f64> = (0..n)
            .map(|j| {
                vertices
                    .iter()
                    .enumerate()
                    .filter(|&(i, _)| i != worst)
                    .map(|(_, v)| v[j])
                    .sum::<f64>()
                    / n as f64
            })
            .collect();
        let toward = |from: &[f64], coeff: f64| -> Vec<f64> {
            clamp(
                centroid
                    .iter()
                    .zip(from)
                    .map(|(c, p)| c + coeff * (p - c))
                    .collect(),
            )
        };

        let reflected = toward(&vertices[worst], -REFLECT);
        let reflected_value = score(&reflected);

        let candidate = if reflected_value < values[best] {
            let expanded = toward(&reflected, EXPAND);
            let expanded_value = score(&expanded);
            if expanded_value < reflected_value {
                Some((expanded, expanded_value))
            } else {
                Some((reflected, reflected_value))
            }
        } else if reflected_value < values[second_worst] {
            Some((reflected, reflected_value))
        } else {
            let (from, limit) = if reflected_value < values[worst] {
                (reflected, reflected_value)
            } else {
                (vertices[worst].clone(), values[worst])
            };
            let contracted = toward(&from, CONTRACT);
            let contracted_value = score(&contracted);
            (contracted_value < limit).then_some((contracted, contracted_value))
        };

        match candidate {
            Some((point, value)) => {
                vertices[worst] = point;
                values[worst] = value;
            }
            None => {
                let anchor = vertices[best].clone();
                for i in (0..=n).filter(|&i| i != best) {
                    let shrunk: Vec<f64> = anchor
                        .iter()
                        .zip(&vertices[i])
                        .map(|(a, v)| a + SHRINK * (v - a))
                        .collect();
                    vertices[i] = clamp(shrunk);
                    values[i] = score(&vertices[i]);
                }
            }
        }
    }

    let best = (0..=n)
        .min_by(|&a, &b| values[a].total_cmp(&values[b]))
        .unwrap_or(0);

    NelderMeadResult {
        optimal_point: vertices[best].clone(),
        optimal_value: values[best],
        iterations,
        converged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn nelder_mead_quadratic_2d() {
        let result = nelder_mead(
            |x| (x[0] - 2.0).powi(2) + (x[1] - 3.0).powi(2),
            &[0.0, 0.0],
            None,
            NelderMeadConfig::default(),
        );

        assert!(result.converged);
        assert_relative_eq!(result.optimal_point[0], 2.0, epsilon = 1e-3);
        assert_relative_eq!(result.optimal_point[1], 3.0, epsilon = 1e-3);
    }

    #[test]
    fn nelder_mead_respects_bounds() {
        // Unconstrained optimum at 5 lies outside [0, 3]
        let result = nelder_mead(
            |x| (x[0] - 5.0).powi(2),
            &[1.0],
            Some(&[(0.0, 3.0)]),
            NelderMeadConfig::default(),
        );
        assert_relative_eq!(result.optimal_point[0], 3.0, epsilon = 1e-4);
    }

    #[test]
    fn nelder_mead_smoothing_sse() {
        let data = [10.0, 12.0, 11.0, 13.0, 14.0, 13.0, 15.0, 16.0];
        let sse = |params: &[f64]| {
            let alpha = params[0];
            let mut level = data[0];
            let mut total = 0.0;
            for &y in &data[1..] {
                total += (y - level) * (y - level);
                level = alpha * y + (1.0 - alpha) * level;
            }
            total
        };

        let result = nelder_mead(sse, &[0.5], Some(&[(0.01, 0.99)]), NelderMeadConfig::default());
        assert!(result.optimal_point[0] >= 0.01 && result.optimal_point[0] <= 0.99);
        assert!(result.optimal_value <= sse(&[0.5]));
    }

    #[test]
    fn nelder_mead_treats_nan_as_worst() {
        let result = nelder_mead(
            |x| if x[0] < 0.0 { f64::NAN } else { (x[0] - 1.0).powi(2) },
            &[0.5],
            None,
            NelderMeadConfig::default(),
        );
        assert!(result.optimal_value.is_finite());
        assert_relative_eq!(result.optimal_point[0], 1.0, epsilon = 1e-3);
    }

    #[test]
    fn nelder_mead_empty_initial() {
        let result = nelder_mead(|_| 0.0, &[], None, NelderMeadConfig::default());
        assert!(!result.converged);
        assert!(result.optimal_value.is_nan());
    }
}
