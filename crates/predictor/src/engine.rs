//! The collaborative filtering engine.
//!
//! `CollaborativeFilter` owns everything a query needs: the frozen rating
//! index, the similarity engine with its cache, and the operating
//! parameters. Neighbor selection and prediction are implemented on it in
//! [`crate::neighbors`] and [`crate::predict`].

use crate::config::PredictionConfig;
use crate::error::Result;
use crate::similarity::SimilarityEngine;
use data_loader::{Query, RatingIndex, UserId};
use rayon::prelude::*;
use std::sync::Arc;
use tracing::{debug, instrument};

/// User-based collaborative filtering over a frozen [`RatingIndex`]
#[derive(Debug)]
pub struct CollaborativeFilter {
    pub(crate) similarity: SimilarityEngine,
    pub(crate) config: PredictionConfig,
}

impl CollaborativeFilter {
    /// Create an engine with the default configuration
    pub fn new(data_index: Arc<RatingIndex>) -> Self {
        Self {
            similarity: SimilarityEngine::new(data_index),
            config: PredictionConfig::default(),
        }
    }

    /// Create an engine with a validated configuration
    pub fn with_config(data_index: Arc<RatingIndex>, config: PredictionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            similarity: SimilarityEngine::new(data_index),
            config,
        })
    }

    pub fn config(&self) -> &PredictionConfig {
        &self.config
    }

    pub fn data_index(&self) -> &Arc<RatingIndex> {
        self.similarity.data_index()
    }

    /// Similarity of two users, memoized
    pub fn similarity(&self, a: UserId, b: UserId) -> f64 {
        self.similarity.similarity(a, b)
    }

    /// Number of user pairs with a memoized similarity
    pub fn cached_pairs(&self) -> usize {
        self.similarity.cached_pairs()
    }

    /// Predict a query with the configured parameters, clamped for output
    pub fn predict(&self, query: Query) -> f64 {
        let raw = self.predict_rating(
            query.user_id,
            query.item_id,
            self.config.neighbors,
            self.config.similarity_threshold,
        );
        self.config.clamp(raw)
    }

    /// Predict many queries in parallel.
    ///
    /// Output order matches input order, and every value equals what
    /// [`Self::predict`] returns for the same query.
    #[instrument(skip(self, queries), fields(queries = queries.len()))]
    pub fn predict_batch(&self, queries: &[Query]) -> Vec<f64> {
        let predictions: Vec<f64> = queries.par_iter().map(|&q| self.predict(q)).collect();
        debug!(
            cached_pairs = self.cached_pairs(),
            "Batch prediction complete"
        );
        predictions
    }

    /// Clamp and format a raw prediction for output
    pub fn format(&self, prediction: f64) -> String {
        self.config.format(prediction)
    }
}
