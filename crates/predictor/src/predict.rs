//! Rating prediction from selected neighbors.
//!
//! ```text
//! prediction = mean(user) + Σ sim·(r(n, item) − mean(n)) / Σ sim
//! ```
//!
//! When the similarity sum is exactly zero (no neighbors, or weights that
//! cancel out) the prediction is the user's own mean. The raw value may
//! fall outside the rating scale; callers clamp it for output.

use crate::engine::CollaborativeFilter;
use crate::neighbors::Neighbor;
use data_loader::{ItemId, UserId};
use serde::Serialize;

/// One neighbor's contribution to a prediction
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Contribution {
    pub neighbor: Neighbor,
    pub rating: f64,
    /// Neighbor's rating minus the neighbor's mean
    pub deviation: f64,
}

/// Breakdown of a single prediction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Explanation {
    pub user_id: UserId,
    pub item_id: ItemId,
    pub user_mean: f64,
    pub contributions: Vec<Contribution>,
    /// Unclamped prediction
    pub raw: f64,
    /// Prediction after clamping to the configured range
    pub clamped: f64,
}

impl Explanation {
    /// True when the neighbor weights summed to zero and the mean was used
    pub fn is_fallback(&self) -> bool {
        total_weight(&self.contributions) == 0.0
    }
}

impl CollaborativeFilter {
    /// Raw (unclamped) prediction of `user_id`'s rating for `item_id`
    pub fn predict_rating(&self, user_id: UserId, item_id: ItemId, k: usize, threshold: f64) -> f64 {
        let neighbors = self.find_neighbors(user_id, item_id, k, threshold);
        let contributions = self.contributions(&neighbors, item_id);
        blend(self.data_index().mean_rating(user_id), &contributions)
    }

    /// Prediction with the configured parameters, plus how it was reached
    pub fn explain(&self, user_id: UserId, item_id: ItemId) -> Explanation {
        let neighbors = self.find_neighbors(
            user_id,
            item_id,
            self.config.neighbors,
            self.config.similarity_threshold,
        );
        let contributions = self.contributions(&neighbors, item_id);
        let user_mean = self.data_index().mean_rating(user_id);
        let raw = blend(user_mean, &contributions);

        Explanation {
            user_id,
            item_id,
            user_mean,
            contributions,
            raw,
            clamped: self.config.clamp(raw),
        }
    }

    /// Pair each neighbor with its rating of the item.
    ///
    /// Neighbors without a rating are skipped; the item index makes that
    /// unreachable, but a missing lookup is not an error.
    fn contributions(&self, neighbors: &[Neighbor], item_id: ItemId) -> Vec<Contribution> {
        let data_index = self.data_index();
        neighbors
            .iter()
            .filter_map(|&neighbor| {
                let profile = data_index.get_user(neighbor.user_id)?;
                let rating = profile.rating_for(item_id)?;
                Some(Contribution {
                    neighbor,
                    rating,
                    deviation: rating - profile.mean_rating,
                })
            })
            .collect()
    }
}

fn total_weight(contributions: &[Contribution]) -> f64 {
    contributions.iter().map(|c| c.neighbor.similarity).sum()
}

fn blend(user_mean: f64, contributions: &[Contribution]) -> f64 {
    let numerator: f64 = contributions
        .iter()
        .map(|c| c.neighbor.similarity * c.deviation)
        .sum();
    let denominator = total_weight(contributions);

    if denominator == 0.0 {
        user_mean
    } else {
        user_mean + numerator / denominator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PredictionConfig;
    use data_loader::{Rating, RatingIndex};
    use std::sync::Arc;

    fn create_test_filter() -> CollaborativeFilter {
        let ratings = [
            (1, 1, 5.0),
            (1, 2, 3.0),
            (2, 1, 4.0),
            (2, 2, 2.0),
            (3, 1, 1.0),
            (3, 2, 5.0),
        ];
        let index = RatingIndex::from_ratings(ratings.into_iter().map(
            |(user_id, item_id, rating)| Rating {
                user_id,
                item_id,
                rating,
            },
        ));
        CollaborativeFilter::new(Arc::new(index))
    }

    #[test]
    fn test_unrated_item_falls_back_to_mean() {
        let filter = create_test_filter();
        assert_eq!(filter.predict_rating(1, 3, 10, 0.0), 4.0);
    }

    #[test]
    fn test_positive_neighbor_shifts_prediction() {
        let filter = create_test_filter();
        // Only user 2 (similarity 1.0, deviation +1.0) passes threshold 0.0
        assert_eq!(filter.predict_rating(1, 1, 10, 0.0), 5.0);
    }

    #[test]
    fn test_cancelling_weights_fall_back_to_mean() {
        let filter = create_test_filter();
        // Similarities +1.0 and -1.0 sum to exactly zero
        assert_eq!(filter.predict_rating(1, 1, 10, -1.0), 4.0);
    }

    #[test]
    fn test_threshold_above_any_similarity() {
        let filter = create_test_filter();
        for user_id in 1..=3 {
            for item_id in 1..=3 {
                assert_eq!(
                    filter.predict_rating(user_id, item_id, 120, 1.1),
                    filter.data_index().mean_rating(user_id)
                );
            }
        }
    }

    #[test]
    fn test_unknown_user_predicts_zero_mean() {
        let filter = create_test_filter();
        assert_eq!(filter.predict_rating(42, 1, 10, 0.0), 0.0);
    }

    #[test]
    fn test_explain_breakdown() {
        let index = create_test_filter().data_index().clone();
        let config = PredictionConfig::default().with_similarity_threshold(0.0);
        let filter = CollaborativeFilter::with_config(index, config).unwrap();

        let explanation = filter.explain(1, 1);
        assert_eq!(explanation.user_mean, 4.0);
        assert_eq!(explanation.contributions.len(), 1);

        let contribution = explanation.contributions[0];
        assert_eq!(contribution.neighbor.user_id, 2);
        assert_eq!(contribution.rating, 4.0);
        assert_eq!(contribution.deviation, 1.0);
        assert_eq!(explanation.raw, 5.0);
        assert_eq!(explanation.clamped, 5.0);
        assert!(!explanation.is_fallback());
    }

    #[test]
    fn test_explain_fallback() {
        let filter = create_test_filter();
        let explanation = filter.explain(1, 3);
        assert!(explanation.is_fallback());
        assert_eq!(explanation.clamped, 4.0);
    }
}
