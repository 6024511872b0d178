//! Winner-take-all metrics of two competing populations.
//!
//! The activity of both populations is binned over time.
//! In every bin, a population wins if its count exceeds the count of the other one by more than a margin.
//! A sequence of consecutive wins is a winning streak, and every switch of winner (or end of a streak) is a state change.
//!
//! # Examples
//!
//! ```rust
//! use rusty_snab::wta::calculate_wta_metrics;
//!
//! let bins_a = [0, 8, 8, 8, 0, 0, 0, 0, 4, 4, 8, 8, 8, 8];
//! let bins_b = [0, 0, 0, 0, 8, 8, 8, 8, 4, 4, 0, 0, 0, 0];
//!
//! let metrics = calculate_wta_metrics(&bins_a, &bins_b, 1.0).unwrap();
//! assert_eq!(metrics.max_win_streak, 4.0);
//! assert_eq!(metrics.num_state_changes, 4.0);
//! assert_eq!(metrics.dead_time, 3.0);
//! ```
use serde::{Deserialize, Serialize};

use crate::error::SNABError;
use crate::spike_train::bin_spike_train;

/// Default number of spikes by which a population has to exceed the other one to win a bin.
pub const DEFAULT_WTA_MARGIN: usize = 5;

/// The WTA indicators of a simulation.
/// All of them are NaN if none of the populations spiked.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct WtaMetrics {
    /// Duration of the longest winning streak.
    pub max_win_streak: f64,
    /// Number of times the winner changed or a streak ended.
    pub num_state_changes: f64,
    /// Total duration of the bins without a winner.
    pub dead_time: f64,
}

impl WtaMetrics {
    /// The metrics of a simulation without any activity.
    pub fn nan() -> Self {
        WtaMetrics {
            max_win_streak: f64::NAN,
            num_state_changes: f64::NAN,
            dead_time: f64::NAN,
        }
    }

    /// Returns true if the metrics could not be evaluated.
    pub fn is_nan(&self) -> bool {
        self.max_win_streak.is_nan() && self.num_state_changes.is_nan() && self.dead_time.is_nan()
    }

    /// The metrics as an array, in the order max winning streak, number of state changes and dead time.
    pub fn to_array(&self) -> [f64; 3] {
        [self.max_win_streak, self.num_state_changes, self.dead_time]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Winner {
    A,
    B,
    Nobody,
}

/// Evaluates winner-take-all metrics with a given winning margin.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct WtaEvaluator {
    margin: usize,
}

impl Default for WtaEvaluator {
    fn default() -> Self {
        WtaEvaluator {
            margin: DEFAULT_WTA_MARGIN,
        }
    }
}

impl WtaEvaluator {
    /// Create an evaluator with the given winning margin.
    pub fn new(margin: usize) -> Self {
        WtaEvaluator { margin }
    }

    pub fn margin(&self) -> usize {
        self.margin
    }

    fn winner(&self, a: usize, b: usize) -> Winner {
        if a > b.saturating_add(self.margin) {
            Winner::A
        } else if b > a.saturating_add(self.margin) {
            Winner::B
        } else {
            Winner::Nobody
        }
    }

    /// Compute the WTA metrics of two binned activities of the same length.
    ///
    /// The bins are processed once, from left to right.
    /// The winning streak and the dead time are scaled by `bin_width`.
    /// Returns an error if the two sequences have different lengths.
    pub fn evaluate(
        &self,
        bins_a: &[usize],
        bins_b: &[usize],
        bin_width: f64,
    ) -> Result<WtaMetrics, SNABError> {
        if bins_a.len() != bins_b.len() {
            return Err(SNABError::IncompatibleBins(format!(
                "the two populations have {} and {} bins",
                bins_a.len(),
                bins_b.len()
            )));
        }

        if bins_a.iter().zip(bins_b.iter()).all(|(&a, &b)| a == 0 && b == 0) {
            return Ok(WtaMetrics::nan());
        }

        let mut streak_a: usize = 0;
        let mut streak_b: usize = 0;
        let mut max_streak: usize = 0;
        let mut num_state_changes: usize = 0;
        let mut num_dead_bins: usize = 0;

        for (i, (&a, &b)) in bins_a.iter().zip(bins_b.iter()).enumerate() {
            match self.winner(a, b) {
                Winner::A => {
                    if streak_a == 0 && i != 0 {
                        num_state_changes += 1;
                        max_streak = max_streak.max(streak_b);
                        streak_b = 0;
                    }
                    streak_a += 1;
                }
                Winner::B => {
                    if streak_b == 0 && i != 0 {
                        num_state_changes += 1;
                        max_streak = max_streak.max(streak_a);
                        streak_a = 0;
                    }
                    streak_b += 1;
                }
                Winner::Nobody => {
                    if streak_a > 0 || streak_b > 0 {
                        num_state_changes += 1;
                        max_streak = max_streak.max(streak_a).max(streak_b);
                    }
                    streak_a = 0;
                    streak_b = 0;
                    num_dead_bins += 1;
                }
            }
        }
        max_streak = max_streak.max(streak_a).max(streak_b);

        log::debug!(
            "WTA over {} bins: max streak of {} bins, {} state changes, {} dead bins",
            bins_a.len(),
            max_streak,
            num_state_changes,
            num_dead_bins
        );

        Ok(WtaMetrics {
            max_win_streak: max_streak as f64 * bin_width,
            num_state_changes: num_state_changes as f64,
            dead_time: num_dead_bins as f64 * bin_width,
        })
    }
}

/// Compute the WTA metrics with the default margin, see [`WtaEvaluator::evaluate`].
pub fn calculate_wta_metrics(
    bins_a: &[usize],
    bins_b: &[usize],
    bin_width: f64,
) -> Result<WtaMetrics, SNABError> {
    WtaEvaluator::default().evaluate(bins_a, bins_b, bin_width)
}
/// Bin the activity of a whole population on `[start, stop)` with bins of about `bin_size`.
/// Bin the activity of a whole population on `[start, stop)` with bins of width `bin_size`.
///
/// There are `floor((stop - start) / bin_size)` bins spread over the whole window, so the actual
/// width of a bin is at least `bin_size`. The count of a bin is the sum of the counts of all neurons.
pub fn summed_bins<S: AsRef<[f64]>>(
    population_signals: &[S],
    start: f64,
    stop: f64,
    bin_size: f64,
) -> Result<Vec<usize>, SNABError> {
    if !(bin_size > 0.0 && bin_size.is_finite()) {
        return Err(SNABError::InvalidParameter(format!(
            "the bin size must be positive and finite, got {}",
            bin_size
        )));
    }
    if !(start.is_finite() && stop.is_finite() && start <= stop) {
        return Err(SNABError::InvalidParameter(format!(
            "the time window [{}, {}) is invalid",
            start, stop
        )));
    }

    let num_bins = ((stop - start) / bin_size).floor() as usize;

    let mut bins = vec![0; num_bins];
    for signal in population_signals.iter() {
        let neuron_bins: Vec<usize> = bin_spike_train(signal.as_ref(), start, stop, num_bins);
        for (bin, count) in bins.iter_mut().zip(neuron_bins) {
            *bin += count;
        }
    }
    Ok(bins)
}
