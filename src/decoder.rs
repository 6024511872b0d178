//! Decoding of population spike trains into rates and labels.
//!
//! A population presents `batch_size` samples one after the other, each for `duration` followed by a `pause`.
//! The spikes of every neuron are binned into one bin per sample, the bins being centered on the presentation windows,
//! i.e., spanning `[-pause / 2, batch_size * (duration + pause) - pause / 2)`.
//!
//! # Examples
//!
//! ```rust
//! use rusty_snab::decoder::{compare_labels, spikes_to_labels, AMBIGUOUS_LABEL};
//!
//! // Three output neurons, two samples of 100 ms separated by 10 ms pauses
//! let signals = vec![
//!     vec![10.0, 20.0, 30.0],
//!     vec![50.0, 120.0, 130.0],
//!     vec![],
//! ];
//! let labels = spikes_to_labels(&signals, 100.0, 10.0, 2).unwrap();
//! assert_eq!(labels, vec![0, 1]);
//! assert_eq!(compare_labels(&[0, 2], &labels).unwrap(), 1);
//! ```
use rayon::prelude::*;

use crate::error::SNABError;
use crate::spike_train::bin_spike_train;

/// The label returned for samples without a unique winner.
pub const AMBIGUOUS_LABEL: u16 = u16::MAX;

/// Minimum number of neurons to bin the spike trains in parallel.
pub const PARALLEL_NEURONS: usize = 100;

fn check_window(duration: f64, pause: f64) -> Result<(), SNABError> {
    if !(duration > 0.0) || !(pause >= 0.0) {
        return Err(SNABError::InvalidParameter(format!(
            "the presentation time must be positive and the pause non-negative, got {} and {}",
            duration, pause
        )));
    }
    Ok(())
}

/// Bin the spike trains of all neurons, one bin per sample.
/// Returns the counts indexed as `counts[neuron][sample]`.
fn binned_spike_counts<S>(
    population_signals: &[S],
    duration: f64,
    pause: f64,
    batch_size: usize,
) -> Vec<Vec<usize>>
where
    S: AsRef<[f64]> + Sync,
{
    let start = -pause * 0.5;
    let stop = batch_size as f64 * (duration + pause) - pause * 0.5;

    if population_signals.len() >= PARALLEL_NEURONS {
        population_signals
            .par_iter()
            .map(|signal| bin_spike_train(signal.as_ref(), start, stop, batch_size))
            .collect()
    } else {
        population_signals
            .iter()
            .map(|signal| bin_spike_train(signal.as_ref(), start, stop, batch_size))
            .collect()
    }
}

/// Converts the spike trains of a population into rates, indexed as `rates[sample][neuron]`.
///
/// With `norm == 0.0`, the raw spike counts are returned.
/// With `norm > 0.0`, the counts of every sample are rescaled so that the most active neuron reaches `norm`.
/// Samples without any activity stay at zero.
pub fn spikes_to_rates<S>(
    population_signals: &[S],
    duration: f64,
    pause: f64,
    batch_size: usize,
    norm: f64,
) -> Result<Vec<Vec<f64>>, SNABError>
where
    S: AsRef<[f64]> + Sync,
{
    check_window(duration, pause)?;
    if !(norm >= 0.0 && norm.is_finite()) {
        return Err(SNABError::InvalidParameter(format!(
            "the normalization must be non-negative and finite, got {}",
            norm
        )));
    }

    let counts = binned_spike_counts(population_signals, duration, pause, batch_size);

    let rates = (0..batch_size)
        .map(|sample| {
            let sample_counts = counts
                .iter()
                .map(|neuron_counts| neuron_counts[sample] as f64)
                .collect::<Vec<f64>>();
            let max = sample_counts.iter().cloned().fold(0.0, f64::max);
            if norm > 0.0 && max > 0.0 {
                sample_counts.iter().map(|c| c * norm / max).collect()
            } else {
                sample_counts
            }
        })
        .collect();

    Ok(rates)
}

/// Converts the spike trains of a population of one-hot coded neurons into labels, one per sample.
///
/// The label of a sample is the index of the neuron with the largest spike count.
/// If several neurons share the maximum or if no neuron fired at all, [`AMBIGUOUS_LABEL`] is returned for that sample.
/// Returns an error if the population is too large for its indices to be distinguished from [`AMBIGUOUS_LABEL`].
pub fn spikes_to_labels<S>(
    population_signals: &[S],
    duration: f64,
    pause: f64,
    batch_size: usize,
) -> Result<Vec<u16>, SNABError>
where
    S: AsRef<[f64]> + Sync,
{
    check_window(duration, pause)?;
    check_population_size(population_signals.len())?;

    let counts = binned_spike_counts(population_signals, duration, pause, batch_size);

    let labels = (0..batch_size)
        .map(|sample| {
            let mut max = 0;
            let mut label = AMBIGUOUS_LABEL;
            for (neuron, neuron_counts) in counts.iter().enumerate() {
                if neuron_counts[sample] > max {
                    max = neuron_counts[sample];
                    label = neuron as u16;
                } else if neuron_counts[sample] == max {
                    label = AMBIGUOUS_LABEL;
                }
            }
            label
        })
        .collect();

    Ok(labels)
}

/// Converts the spike trains of a population into labels using time-to-first-spike decoding.
///
/// The label of a sample is the index of the neuron firing first in the sample window.
/// Simultaneous first spikes and silent windows yield [`AMBIGUOUS_LABEL`].
pub fn spikes_to_labels_ttfs<S>(
    population_signals: &[S],
    duration: f64,
    pause: f64,
    batch_size: usize,
) -> Result<Vec<u16>, SNABError>
where
    S: AsRef<[f64]> + Sync,
{
    check_window(duration, pause)?;
    check_population_size(population_signals.len())?;

    let window = duration + pause;
    let offset = -pause * 0.5;

    let labels = (0..batch_size)
        .map(|sample| {
            let start = offset + sample as f64 * window;
            let stop = start + window;

            let mut first: Option<f64> = None;
            let mut label = AMBIGUOUS_LABEL;
            for (neuron, signal) in population_signals.iter().enumerate() {
                let times = signal.as_ref();
                let pos = times.partition_point(|&t| t < start);
                let Some(&t) = times.get(pos).filter(|&&t| t < stop) else {
                    continue;
                };
                match first {
                    Some(t_first) if t > t_first => {}
                    Some(t_first) if t == t_first => label = AMBIGUOUS_LABEL,
                    _ => {
                        first = Some(t);
                        label = neuron as u16;
                    }
                }
            }
            label
        })
        .collect();

    Ok(labels)
}

fn check_population_size(num_neurons: usize) -> Result<(), SNABError> {
    if num_neurons > AMBIGUOUS_LABEL as usize {
        return Err(SNABError::InvalidParameter(format!(
            "a population of {} neurons cannot be decoded into labels",
            num_neurons
        )));
    }
    Ok(())
}

/// Compare target labels with decoded labels, returning the number of matches.
/// Returns an error if there are more targets than decoded labels.
pub fn compare_labels(target: &[u16], predicted: &[u16]) -> Result<usize, SNABError> {
    if target.len() > predicted.len() {
        return Err(SNABError::IncompatibleLabels(format!(
            "label data has incorrect size! Target: {} Result: {}",
            target.len(),
            predicted.len()
        )));
    }

    Ok(target
        .iter()
        .zip(predicted.iter())
        .filter(|(t, p)| t == p)
        .count())
}
