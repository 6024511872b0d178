//! Energy accounting of simulated networks.
//!
//! - [`network`]: what the energy model needs to know about a simulated network
//! - [`model`]: the calibration of the model from measurements and the estimation of the energy of a network
//!
//! # Examples
//!
//! ```rust
//! use rusty_snab::energy::model::{Measurement, Scenario, Utilization, setup_energy_model};
//!
//! let mut model = setup_energy_model();
//! model.accumulate(Scenario::Idle, &Measurement::new(1000.0, Utilization::default())).unwrap();
//! assert!(model.has_measured(Scenario::Idle));
//!
//! // Fitting requires every scenario to be measured
//! assert!(model.calculate_coefficients(1).is_err());
//! ```
pub mod model;
pub mod network;
