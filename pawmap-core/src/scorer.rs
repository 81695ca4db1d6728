//! Score places for ranking.
//!
//! The `PlaceScorer` trait assigns a ranking score to a
//! [`Place`](crate::Place) given the reviews left for it.

use chrono::{DateTime, Utc};

use crate::{Place, Review};

/// Calculate a ranking score for a place.
///
/// Higher scores rank earlier. Implementations must be pure: identical
/// inputs and `now` must yield bit-identical scores so repeated runs publish
/// the same list. The method is infallible; implementers must return `0.0`
/// when no reviews are available.
///
/// Scores are not normalised and may be negative.
///
/// # Examples
///
/// ```rust
/// use chrono::{DateTime, Utc};
/// use pawmap_core::{Place, PlaceScorer, Review};
///
/// struct ReviewCountScorer;
///
/// impl PlaceScorer for ReviewCountScorer {
///     fn score(&self, _place: &Place, reviews: &[Review], _now: DateTime<Utc>) -> f64 {
///         f64::from(u32::try_from(reviews.len()).unwrap_or(u32::MAX))
///     }
///
///     fn algorithm_version(&self) -> &str {
///         "review_count"
///     }
/// }
///
/// assert_eq!(ReviewCountScorer.algorithm_version(), "review_count");
/// ```
pub trait PlaceScorer: Send + Sync {
    /// Return a score for `place` computed from `reviews` as of `now`.
    fn score(&self, place: &Place, reviews: &[Review], now: DateTime<Utc>) -> f64;

    /// Opaque tag identifying the scoring formula.
    fn algorithm_version(&self) -> &str;
}
