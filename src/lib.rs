//! This crate provides the statistical evaluation of spiking neural network benchmarks in Rust.
//!
//! Benchmarks run small networks on a simulator or a neuromorphic platform and record spike trains.
//! This crate turns them into benchmark indicators.
//!
//! # Binning and Statistics
//!
//! ```rust
//! use rusty_snab::spike_train::{bin_spike_train, SpikeTrain};
//! use rusty_snab::statistics::Statistics;
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//!
//! // Sample a Poisson spike train of 0.1 spikes per ms over one second
//! let mut rng = StdRng::seed_from_u64(42);
//! let spike_train = SpikeTrain::rand_poisson(0.1, 0.0, 1000.0, &mut rng).unwrap();
//!
//! // Count the spikes in bins of 100 ms
//! let bins: Vec<usize> = bin_spike_train(spike_train.firing_times(), 0.0, 1000.0, 10);
//! assert_eq!(bins.iter().sum::<usize>(), spike_train.num_spikes());
//!
//! let stats = Statistics::from_counts(&bins);
//! assert!(stats.min <= stats.mean && stats.mean <= stats.max);
//! ```
//!
//! # Decoding
//!
//! ```rust
//! use rusty_snab::decoder::{compare_labels, spikes_to_labels};
//!
//! // Two output neurons, three samples of 100 ms without pause
//! let signals = vec![vec![10.0, 20.0, 250.0], vec![150.0, 160.0, 170.0]];
//! let labels = spikes_to_labels(&signals, 100.0, 0.0, 3).unwrap();
//! assert_eq!(compare_labels(&[0, 1, 0], &labels).unwrap(), 3);
//! ```
//!
//! # Winner-Take-All
//!
//! ```rust
//! use rusty_snab::wta::{calculate_wta_metrics, summed_bins};
//!
//! let pop_a = vec![vec![51.0, 52.0, 53.0, 54.0, 55.0, 56.0, 57.0, 58.0]];
//! let pop_b: Vec<Vec<f64>> = vec![vec![]];
//! let bins_a = summed_bins(&pop_a, 50.0, 80.0, 15.0).unwrap();
//! let bins_b = summed_bins(&pop_b, 50.0, 80.0, 15.0).unwrap();
//!
//! let metrics = calculate_wta_metrics(&bins_a, &bins_b, 15.0).unwrap();
//! assert_eq!(metrics.max_win_streak, 15.0);
//! assert_eq!(metrics.dead_time, 15.0);
//! ```
//!
//! # Energy
//!
//! See [`energy`].

pub mod config;
pub mod decoder;
pub mod energy;
pub mod error;
pub mod spike_train;
pub mod statistics;
pub mod wta;
