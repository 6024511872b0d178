//! Error module for the Rusty SNAB library.
use std::error::Error;
use std::fmt;

/// Error types for the library.
#[derive(Debug, PartialEq)]
pub enum SNABError {
    /// Error for invalid spike trains, e.g., NaN or unsorted firing times.
    InvalidSpikeTrain(String),
    /// Error for label sequences that cannot be compared, e.g., more targets than predictions.
    IncompatibleLabels(String),
    /// Error for bin sequences that cannot be compared, e.g., different number of bins.
    IncompatibleBins(String),
    /// Error for invalid parameters
    InvalidParameter(String),
    /// Error for I/O operations.
    IOError(String),
    /// Error while (de)serializing a configuration or a model.
    ParseError(String),
}

impl fmt::Display for SNABError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SNABError::InvalidSpikeTrain(e) => write!(f, "Invalid spike train: {}", e),
            SNABError::IncompatibleLabels(e) => write!(f, "Incompatible labels: {}", e),
            SNABError::IncompatibleBins(e) => write!(f, "Incompatible bins: {}", e),
            SNABError::InvalidParameter(e) => write!(f, "Invalid parameters: {}", e),
            SNABError::IOError(e) => write!(f, "I/O error: {}", e),
            SNABError::ParseError(e) => write!(f, "Parse error: {}", e),
        }
    }
}

impl Error for SNABError {}

impl From<std::io::Error> for SNABError {
    fn from(e: std::io::Error) -> Self {
        SNABError::IOError(e.to_string())
    }
}

impl From<serde_json::Error> for SNABError {
    fn from(e: serde_json::Error) -> Self {
        SNABError::ParseError(e.to_string())
    }
}
