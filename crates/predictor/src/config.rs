//! Operating parameters of the predictor.

use crate::error::{PredictorError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunable parameters for neighbor selection and output presentation.
///
/// Defaults reproduce the reference behavior: 120 neighbors, similarity
/// threshold 0.18, outputs clamped to [1.0, 5.0] with one decimal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    /// Maximum number of neighbors blended into a prediction (k)
    pub neighbors: usize,
    /// Minimum similarity for a user to count as a neighbor
    pub similarity_threshold: f64,
    /// Lowest presentable rating
    pub min_rating: f64,
    /// Highest presentable rating
    pub max_rating: f64,
    /// Decimal places used when formatting a prediction
    pub precision: usize,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            neighbors: 120,
            similarity_threshold: 0.18,
            min_rating: 1.0,
            max_rating: 5.0,
            precision: 1,
        }
    }
}

impl PredictionConfig {
    /// Read a JSON config file; missing fields take their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| PredictorError::ConfigRead {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Configure the neighbor count (default: 120)
    pub fn with_neighbors(mut self, neighbors: usize) -> Self {
        self.neighbors = neighbors;
        self
    }

    /// Configure the similarity threshold (default: 0.18)
    pub fn with_similarity_threshold(mut self, threshold: f64) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    /// Configure the presentable rating range (default: 1.0..=5.0)
    pub fn with_rating_range(mut self, min_rating: f64, max_rating: f64) -> Self {
        self.min_rating = min_rating;
        self.max_rating = max_rating;
        self
    }

    /// Configure output decimal places (default: 1)
    pub fn with_precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.similarity_threshold.is_finite() {
            return Err(PredictorError::InvalidConfig(format!(
                "similarity_threshold must be finite, got {}",
                self.similarity_threshold
            )));
        }
        if !self.min_rating.is_finite() || !self.max_rating.is_finite() {
            return Err(PredictorError::InvalidConfig(
                "rating bounds must be finite".to_string(),
            ));
        }
        if self.min_rating > self.max_rating {
            return Err(PredictorError::InvalidConfig(format!(
                "min_rating {} exceeds max_rating {}",
                self.min_rating, self.max_rating
            )));
        }
        Ok(())
    }

    /// Bound a raw prediction to the presentable range.
    ///
    /// Never panics, even on a config that fails [`Self::validate`].
    pub fn clamp(&self, prediction: f64) -> f64 {
        self.min_rating.max(prediction.min(self.max_rating))
    }

    /// Clamp and format a raw prediction for output
    pub fn format(&self, prediction: f64) -> String {
        format!("{:.*}", self.precision, self.clamp(prediction))
    }
}
