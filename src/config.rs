//! Configuration of the evaluation of a benchmark.
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SNABError;
use crate::wta::{WtaEvaluator, DEFAULT_WTA_MARGIN};

/// Parameters of the evaluation, all of them optional in a configuration file.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Number of spikes by which a population has to exceed the other one to win a WTA bin.
    pub wta_margin: usize,
    /// Width of the WTA bins, in milliseconds.
    pub wta_bin_size: f64,
    /// Start of the WTA evaluation window, in milliseconds, skipping the initial transient.
    pub wta_start: f64,
    /// Normalization of the decoded rates, zero for raw spike counts.
    pub label_norm: f64,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        EvaluationConfig {
            wta_margin: DEFAULT_WTA_MARGIN,
            wta_bin_size: 15.0,
            wta_start: 50.0,
            label_norm: 0.0,
        }
    }
}

impl EvaluationConfig {
    /// Load a configuration from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SNABError> {
        let file = File::open(path)?;
        let config: EvaluationConfig = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    /// Save the configuration to a JSON file.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), SNABError> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Check the configuration parameters.
    pub fn validate(&self) -> Result<(), SNABError> {
        if !(self.wta_bin_size > 0.0 && self.wta_bin_size.is_finite()) {
            return Err(SNABError::InvalidParameter(format!(
                "the WTA bin size must be positive, got {}",
                self.wta_bin_size
            )));
        }
        if !self.wta_start.is_finite() {
            return Err(SNABError::InvalidParameter(format!(
                "the WTA start must be finite, got {}",
                self.wta_start
            )));
        }
        if !(self.label_norm >= 0.0 && self.label_norm.is_finite()) {
            return Err(SNABError::InvalidParameter(format!(
                "the label normalization must be non-negative, got {}",
                self.label_norm
            )));
        }
        Ok(())
    }

    /// The WTA evaluator with the configured margin.
    pub fn wta_evaluator(&self) -> WtaEvaluator {
        WtaEvaluator::new(self.wta_margin)
    }
}
