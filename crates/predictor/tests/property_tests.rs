//! Property-based tests for similarity, neighbor selection and prediction.
//!
//! # Invariants tested
//!
//! - **Symmetry:** `similarity(a, b)` and `similarity(b, a)` are bit-identical.
//! - **Range:** similarities stay within [-1, 1] up to rounding, for whole-star
//!   and fractional ratings alike.
//! - **Neighbor cap:** at most `k` neighbors, all at or above the threshold.
//! - **Fallback:** an unreachable threshold yields the user's mean.
//! - **Clamping:** presented predictions stay within the rating range.

use data_loader::{ItemId, Rating, RatingIndex, UserId};
use predictor::{CollaborativeFilter, PredictionConfig};
use proptest::prelude::*;
use std::sync::Arc;

const MAX_USER: UserId = 8;
const MAX_ITEM: ItemId = 10;
const TOLERANCE: f64 = 1e-9;

/// Sparse rating matrices with whole-star ratings
fn ratings_strategy() -> impl Strategy<Value = Vec<Rating>> {
    prop::collection::vec(
        (1..=MAX_USER, 1..=MAX_ITEM, 1u8..=5u8).prop_map(|(user_id, item_id, stars)| Rating {
            user_id,
            item_id,
            rating: f64::from(stars),
        }),
        0..60,
    )
}

/// Sparse rating matrices with arbitrary ratings inside the scale
fn fractional_ratings_strategy() -> impl Strategy<Value = Vec<Rating>> {
    prop::collection::vec(
        (1..=MAX_USER, 1..=MAX_ITEM, 1.0f64..=5.0).prop_map(|(user_id, item_id, rating)| Rating {
            user_id,
            item_id,
            rating,
        }),
        0..60,
    )
}

fn build_filter(ratings: Vec<Rating>) -> CollaborativeFilter {
    CollaborativeFilter::new(Arc::new(RatingIndex::from_ratings(ratings)))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn similarity_is_symmetric(
        ratings in ratings_strategy(),
        a in 1..=MAX_USER,
        b in 1..=MAX_USER,
    ) {
        let forward = build_filter(ratings.clone()).similarity(a, b);
        let backward = build_filter(ratings).similarity(b, a);
        prop_assert_eq!(forward.to_bits(), backward.to_bits());
    }

    #[test]
    fn similarity_stays_in_range(ratings in ratings_strategy()) {
        let filter = build_filter(ratings);
        for a in 1..=MAX_USER {
            for b in 1..=MAX_USER {
                let sim = filter.similarity(a, b);
                prop_assert!(sim.is_finite());
                prop_assert!(
                    (-1.0 - TOLERANCE..=1.0 + TOLERANCE).contains(&sim),
                    "similarity({}, {}) = {} out of range", a, b, sim
                );
            }
        }
    }

    #[test]
    fn fractional_similarity_stays_in_range(ratings in fractional_ratings_strategy()) {
        let filter = build_filter(ratings);
        for a in 1..=MAX_USER {
            for b in 1..=MAX_USER {
                let sim = filter.similarity(a, b);
                prop_assert!(sim.is_finite());
                prop_assert!(
                    (-1.0 - TOLERANCE..=1.0 + TOLERANCE).contains(&sim),
                    "similarity({}, {}) = {} out of range", a, b, sim
                );
                prop_assert_eq!(sim.to_bits(), filter.similarity(b, a).to_bits());
            }
        }
    }

    #[test]
    fn fractional_predictions_are_clamped(
        ratings in fractional_ratings_strategy(),
        user_id in 1..=MAX_USER,
        item_id in 1..=MAX_ITEM,
    ) {
        let filter = CollaborativeFilter::with_config(
            Arc::new(RatingIndex::from_ratings(ratings)),
            PredictionConfig::default().with_similarity_threshold(-1.0),
        ).unwrap();

        let value = filter.predict(data_loader::Query::new(user_id, item_id));
        prop_assert!((1.0..=5.0).contains(&value));
    }

    #[test]
    fn neighbors_respect_cap_and_threshold(
        ratings in ratings_strategy(),
        user_id in 1..=MAX_USER,
        item_id in 1..=MAX_ITEM,
        k in 0usize..6,
        threshold in -1.0f64..1.0,
    ) {
        let filter = build_filter(ratings);
        let neighbors = filter.find_neighbors(user_id, item_id, k, threshold);

        prop_assert!(neighbors.len() <= k);
        for pair in neighbors.windows(2) {
            prop_assert!(pair[0].similarity >= pair[1].similarity);
        }
        for neighbor in &neighbors {
            prop_assert!(neighbor.similarity >= threshold);
            prop_assert_ne!(neighbor.user_id, user_id);
            prop_assert!(filter.data_index().rating(neighbor.user_id, item_id).is_some());
        }
    }

    #[test]
    fn unreachable_threshold_falls_back_to_mean(
        ratings in ratings_strategy(),
        user_id in 1..=MAX_USER,
        item_id in 1..=MAX_ITEM,
    ) {
        let filter = build_filter(ratings);
        let prediction = filter.predict_rating(user_id, item_id, 120, 1.1);
        prop_assert_eq!(prediction, filter.data_index().mean_rating(user_id));
    }

    #[test]
    fn presented_predictions_are_clamped(
        ratings in ratings_strategy(),
        user_id in 1..=MAX_USER + 2,
        item_id in 1..=MAX_ITEM + 2,
        threshold in -1.0f64..1.0,
    ) {
        let config = PredictionConfig::default().with_similarity_threshold(threshold);
        let filter = CollaborativeFilter::with_config(
            Arc::new(RatingIndex::from_ratings(ratings)),
            config,
        ).unwrap();

        let value = filter.predict(data_loader::Query::new(user_id, item_id));
        prop_assert!((1.0..=5.0).contains(&value));
    }
}
