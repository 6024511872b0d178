//! Module implementing the concept of a spike train and its time binning.
//!
//! A spike train is a sorted sequence of firing times, conventionally in milliseconds.
//! Binning partitions a time window `[start, stop)` into equally wide bins and counts the spikes falling into each of them.
//!
//! # Examples
//!
//! ```rust
//! use rusty_snab::spike_train::{bin_spike_train, SpikeTrain};
//!
//! let spike_train = SpikeTrain::build(vec![0.5, 1.5, 1.75, 3.0, 4.0]).unwrap();
//!
//! // 4 bins of width 1.0 over [0, 4), the spike at 4.0 lies outside the window
//! let bins: Vec<usize> = bin_spike_train(spike_train.firing_times(), 0.0, 4.0, 4);
//! assert_eq!(bins, vec![1, 2, 0, 1]);
//! ```
use rand::Rng;
use rand_distr::{Distribution, Exp};
use serde::{Deserialize, Serialize};

use crate::error::SNABError;

/// A counter type usable as the element of a binned spike train.
///
/// Integer counters saturate instead of overflowing.
pub trait BinCount: Copy + PartialOrd + Send {
    /// The empty bin.
    fn zero() -> Self;
    /// Count one more spike.
    fn increment(&mut self);
    /// Conversion to a real value, e.g., for rate normalization.
    fn to_f64(self) -> f64;
}

macro_rules! impl_bin_count_int {
    ($($t:ty),*) => {
        $(
            impl BinCount for $t {
                fn zero() -> Self {
                    0
                }

                fn increment(&mut self) {
                    *self = self.saturating_add(1);
                }

                fn to_f64(self) -> f64 {
                    self as f64
                }
            }
        )*
    };
}

impl_bin_count_int!(u16, u32, u64, usize);

impl BinCount for f64 {
    fn zero() -> Self {
        0.0
    }

    fn increment(&mut self) {
        *self += 1.0;
    }

    fn to_f64(self) -> f64 {
        self
    }
}

/// Represents the spike train of a single neuron (or channel).
#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
pub struct SpikeTrain {
    firing_times: Vec<f64>,
}

impl SpikeTrain {
    /// Create a spike train from a sequence of firing times.
    /// The function returns an error if a firing time is not finite or if the sequence is not sorted.
    /// The firing times are never reordered.
    pub fn build(firing_times: Vec<f64>) -> Result<Self, SNABError> {
        if let Some(t) = firing_times.iter().find(|t| !t.is_finite()) {
            return Err(SNABError::InvalidSpikeTrain(format!(
                "firing time {} is not finite",
                t
            )));
        }

        if let Some(ts) = firing_times.windows(2).find(|ts| ts[1] < ts[0]) {
            return Err(SNABError::InvalidSpikeTrain(format!(
                "firing times must be sorted, got {} before {}",
                ts[0], ts[1]
            )));
        }

        Ok(SpikeTrain { firing_times })
    }

    /// Sample a Poisson spike train with the given firing rate (spikes per unit of time) on `[start, stop)`.
    pub fn rand_poisson<R: Rng>(
        firing_rate: f64,
        start: f64,
        stop: f64,
        rng: &mut R,
    ) -> Result<Self, SNABError> {
        if !(firing_rate >= 0.0 && firing_rate.is_finite()) {
            return Err(SNABError::InvalidParameter(format!(
                "the firing rate must be non-negative and finite, got {}",
                firing_rate
            )));
        }
        if !(start.is_finite() && stop.is_finite() && start <= stop) {
            return Err(SNABError::InvalidParameter(format!(
                "the time window [{}, {}) is invalid",
                start, stop
            )));
        }
        if firing_rate == 0.0 {
            return Ok(SpikeTrain::default());
        }

        let exp = Exp::new(firing_rate)
            .map_err(|e| SNABError::InvalidParameter(format!("Invalid rate: {}", e)))?;

        let mut firing_times = Vec::new();
        let mut time = start + exp.sample(rng);
        while time < stop {
            firing_times.push(time);
            time += exp.sample(rng);
        }

        Ok(SpikeTrain { firing_times })
    }

    /// Returns the firing times of the spike train.
    pub fn firing_times(&self) -> &[f64] {
        &self.firing_times[..]
    }

    /// Returns the number of spikes in the spike train.
    pub fn num_spikes(&self) -> usize {
        self.firing_times.len()
    }

    /// Returns true if the spike train has no spikes.
    pub fn is_empty(&self) -> bool {
        self.firing_times.is_empty()
    }
}

impl AsRef<[f64]> for SpikeTrain {
    fn as_ref(&self) -> &[f64] {
        self.firing_times()
    }
}

/// Bin the firing times into `num_bins` equally wide bins spanning `[start, stop)`.
///
/// Spike `t` lands in bin `floor((t - start) / width)`, clamped to the last bin.
/// Spikes outside the window are silently dropped.
/// An empty spike train yields all-zero bins and `num_bins == 0` yields no bins at all.
/// If the window is empty (`stop <= start`), every bin is zero.
pub fn bin_spike_train<T: BinCount>(
    firing_times: &[f64],
    start: f64,
    stop: f64,
    num_bins: usize,
) -> Vec<T> {
    let mut bins = vec![T::zero(); num_bins];
    if num_bins == 0 || !(stop > start) {
        return bins;
    }

    let width = (stop - start) / num_bins as f64;
    firing_times
        .iter()
        .filter(|&&t| t >= start && t < stop)
        .for_each(|&t| {
            let idx = (((t - start) / width).floor() as usize).min(num_bins - 1);
            bins[idx].increment();
        });

    bins
}

/// Count the spikes in the closed interval `[start, end]`.
/// Use `f64::INFINITY` as `end` to count every spike from `start` on.
pub fn count_spikes(firing_times: &[f64], start: f64, end: f64) -> usize {
    firing_times
        .iter()
        .filter(|&&t| t >= start && t <= end)
        .count()
}

/// Returns the instantaneous frequencies `1 / (t[i+1] - t[i])` of all consecutive spike pairs whose first spike occurs strictly after `start`.
/// Pairs of identical firing times (a known hardware artifact) are skipped.
pub fn inter_spike_frequencies(firing_times: &[f64], start: f64) -> Vec<f64> {
    firing_times
        .windows(2)
        .filter(|ts| ts[0] > start && ts[1] != ts[0])
        .map(|ts| 1.0 / (ts[1] - ts[0]))
        .collect()
}
