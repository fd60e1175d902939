//! # Predictor Crate
//!
//! User-based collaborative filtering: predicts how a user would rate an
//! item from the ratings of users with similar taste.
//!
//! ## Components
//!
//! ### Similarity Engine
//! Pearson correlation between two users over the items both rated,
//! memoized under an order-independent user-pair key.
//!
//! ### Neighbor Selection
//! Users who rated the target item, filtered by a similarity threshold,
//! top `k` by similarity.
//!
//! ### Prediction
//! The user's mean rating shifted by the similarity-weighted average of the
//! neighbors' deviations from their own means.
//!
//! ## Example Usage
//!
//! ```
//! use data_loader::{Query, RatingStore};
//! use predictor::{CollaborativeFilter, PredictionConfig};
//! use std::sync::Arc;
//!
//! let mut store = RatingStore::new();
//! store.record_rating(1, 1, 5.0);
//! store.record_rating(1, 2, 3.0);
//! store.record_rating(2, 1, 4.0);
//! store.record_rating(2, 2, 2.0);
//! store.record_rating(2, 3, 4.0);
//!
//! let config = PredictionConfig::default().with_neighbors(10);
//! let filter = CollaborativeFilter::with_config(Arc::new(store.finalize()), config)?;
//!
//! let prediction = filter.predict(Query::new(1, 3));
//! // 4.0 + (4.0 - 10/3)
//! assert_eq!(filter.format(prediction), "4.7");
//! # Ok::<(), predictor::PredictorError>(())
//! ```

// Public modules
pub mod config;
pub mod engine;
pub mod error;
pub mod neighbors;
pub mod predict;
pub mod similarity;

// Re-export commonly used types
pub use config::PredictionConfig;
pub use engine::CollaborativeFilter;
pub use error::{PredictorError, Result};
pub use neighbors::Neighbor;
pub use predict::{Contribution, Explanation};
pub use similarity::{PairKey, SimilarityCache, SimilarityEngine, VARIANCE_EPSILON};
