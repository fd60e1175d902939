//! Error types for the predictor crate.
//!
//! Predictions themselves never fail; only configuration can be rejected.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PredictorError {
    /// A configuration value is out of its usable range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be read
    #[error("Failed to read config {path}: {source}")]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid JSON for [`crate::PredictionConfig`]
    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PredictorError>;
