//! Descriptive statistics over finite sequences of benchmark values.
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::spike_train::BinCount;

/// Minimum, maximum, mean and sample standard deviation of a sequence.
///
/// # Examples
///
/// ```rust
/// use approx::assert_relative_eq;
/// use rusty_snab::statistics::calculate_statistics;
///
/// let stats = calculate_statistics(&[2.0, 2.0, 3.0, 3.0]);
/// assert_eq!(stats.min, 2.0);
/// assert_eq!(stats.max, 3.0);
/// assert_relative_eq!(stats.mean, 2.5);
/// assert_relative_eq!(stats.std_dev, (1.0_f64 / 3.0).sqrt());
/// ```
#[derive(Debug, PartialEq, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Statistics {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Sample standard deviation, i.e., with Bessel's correction.
    pub std_dev: f64,
}

impl Statistics {
    /// Statistics over binned spike counts (or any other counter).
    pub fn from_counts<T: BinCount>(counts: &[T]) -> Self {
        let values: Vec<f64> = counts.iter().map(|c| c.to_f64()).collect();
        calculate_statistics(&values)
    }

    /// Collapse the values of one indicator over repeated benchmark runs.
    /// NaN entries mark runs which did not report the indicator and are ignored.
    /// Returns `None` if no run reported a value.
    pub fn from_repeats(values: &[f64]) -> Option<Self> {
        let values = values
            .iter()
            .filter(|v| !v.is_nan())
            .cloned()
            .collect::<Vec<f64>>();
        if values.is_empty() {
            None
        } else {
            Some(calculate_statistics(&values))
        }
    }
}

/// Compute the statistics of a sequence.
///
/// An empty sequence gives all zeros and a singleton has a zero standard deviation.
/// Otherwise, the standard deviation uses the divisor `n - 1`.
/// The mean and the squared deviations are accumulated in two separate passes to avoid cancellation.
pub fn calculate_statistics(values: &[f64]) -> Statistics {
    match values.len() {
        0 => Statistics::default(),
        1 => Statistics {
            min: values[0],
            max: values[0],
            mean: values[0],
            std_dev: 0.0,
        },
        n => {
            let (min, max) = match values.iter().minmax_by(|a, b| a.total_cmp(b)) {
                itertools::MinMaxResult::MinMax(min, max) => (*min, *max),
                itertools::MinMaxResult::OneElement(x) => (*x, *x),
                itertools::MinMaxResult::NoElements => (0.0, 0.0),
            };
            let mean = values.iter().sum::<f64>() / n as f64;
            let sq_dev = values.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>();
            Statistics {
                min,
                max,
                mean,
                std_dev: (sq_dev / (n - 1) as f64).sqrt(),
            }
        }
    }
}
