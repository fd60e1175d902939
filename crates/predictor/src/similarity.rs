//! Pearson similarity between users, memoized per unordered user pair.
//!
//! ## Algorithm
//! Over the items both users rated, each rating is centered on its user's
//! overall mean (not the mean of the co-rated subset). Then
//!
//! ```text
//! sim(a, b) = Σ ca·cb / sqrt(Σ ca² · Σ cb²)
//! ```
//!
//! When either sum of squares is below [`VARIANCE_EPSILON`] the pair has no
//! usable correlation and the similarity is 0.0. That also covers pairs
//! with no co-rated items.

use data_loader::{RatingIndex, UserId, UserProfile};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::trace;

/// Sums of squared deviations below this count as zero variance
pub const VARIANCE_EPSILON: f64 = 1e-10;

/// Order-independent key for a pair of users.
///
/// Always stores the smaller id first, so `(a, b)` and `(b, a)` are the
/// same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey(UserId, UserId);

impl PairKey {
    pub fn new(a: UserId, b: UserId) -> Self {
        if a <= b { Self(a, b) } else { Self(b, a) }
    }

    pub fn low(&self) -> UserId {
        self.0
    }

    pub fn high(&self) -> UserId {
        self.1
    }
}

/// Write-once store of computed similarities.
///
/// Grows monotonically; entries are never evicted or replaced.
#[derive(Debug, Default)]
pub struct SimilarityCache {
    entries: RwLock<HashMap<PairKey, f64>>,
}

impl SimilarityCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: PairKey) -> Option<f64> {
        // A poisoned lock still holds fully written entries.
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(&key).copied()
    }

    /// Store a value unless the pair already has one; returns the stored value
    pub fn insert(&self, key: PairKey, value: f64) -> f64 {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        *entries.entry(key).or_insert(value)
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Pearson correlation of two users over their co-rated items.
///
/// Iterates the smaller rating set and looks each item up in the larger one.
pub fn pearson_correlation(a: &UserProfile, b: &UserProfile) -> f64 {
    let (outer, inner, outer_mean, inner_mean) = if a.ratings.len() <= b.ratings.len() {
        (a, b, a.mean_rating, b.mean_rating)
    } else {
        (b, a, b.mean_rating, a.mean_rating)
    };

    let mut numerator = 0.0;
    let mut outer_denom = 0.0;
    let mut inner_denom = 0.0;

    for (item_id, &outer_rating) in &outer.ratings {
        if let Some(&inner_rating) = inner.ratings.get(item_id) {
            let centered_outer = outer_rating - outer_mean;
            let centered_inner = inner_rating - inner_mean;

            numerator += centered_outer * centered_inner;
            outer_denom += centered_outer * centered_outer;
            inner_denom += centered_inner * centered_inner;
        }
    }

    if outer_denom < VARIANCE_EPSILON || inner_denom < VARIANCE_EPSILON {
        return 0.0;
    }

    numerator / (outer_denom * inner_denom).sqrt()
}

/// Computes and memoizes user-user similarities over a frozen index
#[derive(Debug)]
pub struct SimilarityEngine {
    /// Shared reference to the rating index (read-only, so no lock needed)
    data_index: Arc<RatingIndex>,
    cache: SimilarityCache,
}

impl SimilarityEngine {
    pub fn new(data_index: Arc<RatingIndex>) -> Self {
        Self {
            data_index,
            cache: SimilarityCache::new(),
        }
    }

    /// Similarity of two users; symmetric and cached after the first call.
    ///
    /// Unknown users have no ratings and therefore similarity 0.0.
    pub fn similarity(&self, a: UserId, b: UserId) -> f64 {
        let key = PairKey::new(a, b);
        if let Some(cached) = self.cache.get(key) {
            return cached;
        }

        let value = match (
            self.data_index.get_user(key.low()),
            self.data_index.get_user(key.high()),
        ) {
            (Some(low), Some(high)) => pearson_correlation(low, high),
            _ => 0.0,
        };
        trace!(low = key.low(), high = key.high(), value, "Computed similarity");

        self.cache.insert(key, value)
    }

    /// Number of user pairs with a memoized similarity
    pub fn cached_pairs(&self) -> usize {
        self.cache.len()
    }

    pub fn data_index(&self) -> &Arc<RatingIndex> {
        &self.data_index
    }
}
