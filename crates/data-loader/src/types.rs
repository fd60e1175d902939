//! Core domain types for rating data.
//!
//! Two containers model the two phases of the system:
//! - [`RatingStore`] accepts ratings while data is being ingested
//! - [`RatingIndex`] is the frozen result of [`RatingStore::finalize`], with
//!   per-user means and the item-to-users index precomputed
//!
//! Only `RatingIndex` is accepted by the prediction engine, so queries
//! against half-built data are rejected at compile time.

use std::collections::{BTreeMap, HashMap};

// =============================================================================
// Type Aliases
// =============================================================================

/// Unique identifier for a user; any signed integer is accepted
pub type UserId = i64;

/// Unique identifier for a rated item
pub type ItemId = i64;

/// Ratings of one user, keyed by item.
///
/// Ordered so that sums over a user's ratings always run in the same order
/// and produce bit-identical results from run to run.
pub type UserRatings = BTreeMap<ItemId, f64>;

static NO_RATINGS: UserRatings = BTreeMap::new();

// =============================================================================
// Records
// =============================================================================

/// A single rating record from the training section
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rating {
    pub user_id: UserId,
    pub item_id: ItemId,
    pub rating: f64,
}

/// A prediction request from the query section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Query {
    pub user_id: UserId,
    pub item_id: ItemId,
}

impl Query {
    pub fn new(user_id: UserId, item_id: ItemId) -> Self {
        Self { user_id, item_id }
    }
}

// =============================================================================
// UserProfile
// =============================================================================

/// Everything known about one user.
///
/// `mean_rating` is 0.0 until the owning store is finalized.
#[derive(Debug, Clone)]
pub struct UserProfile {
    pub id: UserId,
    pub ratings: UserRatings,
    pub mean_rating: f64,
}

impl UserProfile {
    pub fn new(id: UserId) -> Self {
        Self {
            id,
            ratings: BTreeMap::new(),
            mean_rating: 0.0,
        }
    }

    /// Arithmetic mean of the ratings, 0.0 when there are none
    pub fn compute_mean(&self) -> f64 {
        if self.ratings.is_empty() {
            return 0.0;
        }
        let total: f64 = self.ratings.values().sum();
        total / self.ratings.len() as f64
    }

    pub fn rating_for(&self, item_id: ItemId) -> Option<f64> {
        self.ratings.get(&item_id).copied()
    }
}

// =============================================================================
// RatingStore - ingestion phase
// =============================================================================

/// Mutable rating container used while ingesting.
///
/// Users are kept in the order they first appear, which fixes the order of
/// the item index built from them.
#[derive(Debug, Default)]
pub struct RatingStore {
    pub(crate) profiles: Vec<UserProfile>,
    pub(crate) positions: HashMap<UserId, usize>,
}

impl RatingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a sequence of rating records
    pub fn from_ratings(ratings: impl IntoIterator<Item = Rating>) -> Self {
        let mut store = Self::new();
        for rating in ratings {
            store.insert_rating(rating);
        }
        store
    }

    /// Record a rating, overwriting any earlier rating of the same item
    pub fn record_rating(&mut self, user_id: UserId, item_id: ItemId, rating: f64) {
        let position = match self.positions.get(&user_id) {
            Some(&position) => position,
            None => {
                self.profiles.push(UserProfile::new(user_id));
                let position = self.profiles.len() - 1;
                self.positions.insert(user_id, position);
                position
            }
        };
        self.profiles[position].ratings.insert(item_id, rating);
    }

    pub fn insert_rating(&mut self, rating: Rating) {
        self.record_rating(rating.user_id, rating.item_id, rating.rating);
    }

    pub fn get_user(&self, user_id: UserId) -> Option<&UserProfile> {
        self.positions
            .get(&user_id)
            .map(|&position| &self.profiles[position])
    }

    /// Get counts for debugging/validation: (users, ratings)
    pub fn counts(&self) -> (usize, usize) {
        let total_ratings = self.profiles.iter().map(|p| p.ratings.len()).sum();
        (self.profiles.len(), total_ratings)
    }
}

// =============================================================================
// RatingIndex - query phase
// =============================================================================

/// Frozen ratings with precomputed means and the item-to-users index.
///
/// Read-only: share it behind an `Arc` between any number of readers.
#[derive(Debug)]
pub struct RatingIndex {
    pub(crate) profiles: Vec<UserProfile>,
    pub(crate) positions: HashMap<UserId, usize>,
    /// Users who rated each item, in user insertion order
    pub(crate) item_users: HashMap<ItemId, Vec<UserId>>,
}

impl RatingIndex {
    /// Get a user by ID
    pub fn get_user(&self, user_id: UserId) -> Option<&UserProfile> {
        self.positions
            .get(&user_id)
            .map(|&position| &self.profiles[position])
    }

    /// All ratings of a user; empty for unknown users
    pub fn user_ratings(&self, user_id: UserId) -> &UserRatings {
        self.get_user(user_id)
            .map(|profile| &profile.ratings)
            .unwrap_or(&NO_RATINGS)
    }

    /// Mean rating of a user; 0.0 for unknown users
    pub fn mean_rating(&self, user_id: UserId) -> f64 {
        self.get_user(user_id)
            .map(|profile| profile.mean_rating)
            .unwrap_or(0.0)
    }

    pub fn rating(&self, user_id: UserId, item_id: ItemId) -> Option<f64> {
        self.get_user(user_id)?.rating_for(item_id)
    }

    /// Users who rated an item; empty if nobody did
    pub fn item_raters(&self, item_id: ItemId) -> &[UserId] {
        self.item_users
            .get(&item_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Users in insertion order
    pub fn users(&self) -> impl Iterator<Item = &UserProfile> {
        self.profiles.iter()
    }

    /// Every rated item, in no particular order
    pub fn items(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.item_users.keys().copied()
    }

    /// Get counts for debugging/validation: (users, items, ratings)
    pub fn counts(&self) -> (usize, usize, usize) {
        let total_ratings = self.profiles.iter().map(|p| p.ratings.len()).sum();
        (self.profiles.len(), self.item_users.len(), total_ratings)
    }

    /// Mean over every rating in the index, 0.0 when empty
    pub fn global_mean(&self) -> f64 {
        let (sum, count) = self
            .profiles
            .iter()
            .flat_map(|p| p.ratings.values())
            .fold((0.0, 0usize), |(sum, count), r| (sum + r, count + 1));
        if count == 0 { 0.0 } else { sum / count as f64 }
    }
}
