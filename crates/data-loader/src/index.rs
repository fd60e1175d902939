//! Turning ingested ratings into a queryable [`RatingIndex`].
//!
//! Finalizing is the only way to obtain a `RatingIndex`. It:
//! - computes every user's mean rating
//! - builds the item-to-users index in user insertion order

use crate::error::{DataLoadError, Result};
use crate::parser::{self, ParsedInput};
use crate::types::*;
use rayon::prelude::*;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info};

impl RatingStore {
    /// Freeze the store: compute means and build the item index.
    ///
    /// Consumes the store, so no rating can be recorded afterwards.
    pub fn finalize(self) -> RatingIndex {
        let RatingStore {
            mut profiles,
            positions,
        } = self;

        compute_user_means(&mut profiles);
        let item_users = build_item_index(&profiles);

        let index = RatingIndex {
            profiles,
            positions,
            item_users,
        };
        let (users, items, ratings) = index.counts();
        info!(users, items, ratings, "Rating index finalized");
        index
    }
}

impl RatingIndex {
    /// Build an index straight from rating records
    pub fn from_ratings(ratings: impl IntoIterator<Item = Rating>) -> Self {
        RatingStore::from_ratings(ratings).finalize()
    }

    /// Load training data and queries from a file.
    ///
    /// Returns the finalized index together with the queries that followed
    /// the training section.
    pub fn load_from_file(path: &Path) -> Result<(Self, Vec<Query>)> {
        info!("Loading ratings from {:?}", path);
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => DataLoadError::FileNotFound {
                path: path.display().to_string(),
            },
            _ => DataLoadError::IoError(e),
        })?;
        Self::load_from_reader(BufReader::new(file))
    }

    /// Load training data and queries from any buffered reader
    pub fn load_from_reader<R: BufRead>(reader: R) -> Result<(Self, Vec<Query>)> {
        let ParsedInput { ratings, queries } = parser::parse_input(reader)?;
        debug!(
            ratings = ratings.len(),
            queries = queries.len(),
            "Parsed input"
        );
        Ok((Self::from_ratings(ratings), queries))
    }
}

fn compute_user_means(profiles: &mut [UserProfile]) {
    profiles.par_iter_mut().for_each(|profile| {
        profile.mean_rating = profile.compute_mean();
    });
}

/// Map each item to the users who rated it.
///
/// Each user holds at most one rating per item, so a user is pushed at
/// most once per item list.
fn build_item_index(profiles: &[UserProfile]) -> HashMap<ItemId, Vec<UserId>> {
    let mut item_users: HashMap<ItemId, Vec<UserId>> = HashMap::new();
    for profile in profiles {
        for &item_id in profile.ratings.keys() {
            item_users.entry(item_id).or_default().push(profile.id);
        }
    }
    item_users
}
