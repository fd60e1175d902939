//! # Data Loader Crate
//!
//! This crate ingests user-item ratings and freezes them into an index the
//! prediction engine can query.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (UserProfile, Rating, Query, RatingStore, RatingIndex)
//! - **parser**: Parse the line-oriented training/query input
//! - **index**: Finalize a store into a RatingIndex (means + item index)
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```
//! use data_loader::RatingStore;
//!
//! let mut store = RatingStore::new();
//! store.record_rating(1, 10, 5.0);
//! store.record_rating(1, 11, 3.0);
//! store.record_rating(2, 10, 4.0);
//!
//! let index = store.finalize();
//! assert_eq!(index.mean_rating(1), 4.0);
//! assert_eq!(index.item_raters(10), &[1, 2]);
//! ```

// Public modules
pub mod error;
pub mod types;
pub mod parser;
pub mod index;

// Re-export commonly used types for convenience
pub use error::{DataLoadError, Result};
pub use parser::{ParsedInput, TRAINING_SENTINEL};
pub use types::{
    // Type aliases
    UserId,
    ItemId,
    UserRatings,
    // Core types
    Rating,
    Query,
    UserProfile,
    RatingStore,
    RatingIndex,
};
