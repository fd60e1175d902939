//! Neighbor selection for a (user, item) query.
//!
//! ## Algorithm
//! 1. Candidates are the users who rated the item, minus the querying user
//! 2. Score each candidate by similarity to the querying user
//! 3. Drop candidates below the threshold
//! 4. Keep the top `k` by similarity
//!
//! Ties keep discovery order: candidates come out of the item index in user
//! insertion order and the sort is stable, so among equal similarities the
//! user ingested first wins a slot at the `k`-th boundary.

use crate::engine::CollaborativeFilter;
use data_loader::{ItemId, UserId};
use serde::Serialize;
use tracing::{debug, instrument};

/// A user selected to inform a prediction
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Neighbor {
    pub user_id: UserId,
    pub similarity: f64,
}

impl CollaborativeFilter {
    /// Up to `k` most similar users who rated `item_id`, best first.
    ///
    /// Every returned similarity is at least `threshold`.
    #[instrument(level = "debug", skip(self))]
    pub fn find_neighbors(
        &self,
        user_id: UserId,
        item_id: ItemId,
        k: usize,
        threshold: f64,
    ) -> Vec<Neighbor> {
        if k == 0 {
            return Vec::new();
        }

        let raters = self.data_index().item_raters(item_id);
        let mut neighbors: Vec<Neighbor> = raters
            .iter()
            .filter(|&&other| other != user_id)
            .filter_map(|&other| {
                let similarity = self.similarity(user_id, other);
                (similarity >= threshold).then_some(Neighbor {
                    user_id: other,
                    similarity,
                })
            })
            .collect();

        // Stable sort keeps discovery order among ties
        neighbors.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        neighbors.truncate(k);

        debug!(
            candidates = raters.len(),
            selected = neighbors.len(),
            "Selected neighbors"
        );
        neighbors
    }
}
