//! Top-picks ranking for PawMap places.
//!
//! The crate turns places and their reviews into a bounded, descending
//! [`TopPicksList`]. Scoring blends four signals:
//! - the mean star rating,
//! - a logarithmic review-volume bonus, so very busy places saturate rather
//!   than dominate,
//! - a recency bonus for the share of reviews left in the last 30 days,
//! - a verification bonus,
//!
//! and subtracts a linear penalty per report filed against the place.
//!
//! Everything here is a pure function of its inputs and the supplied `now`;
//! persistence is the caller's job.
//!
//! # Examples
//!
//! ```
//! use std::collections::HashMap;
//!
//! use chrono::Utc;
//! use pawmap_core::{Author, Place, PlaceCategory, PlaceId, UserId};
//! use pawmap_scorer::build_top_picks;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let author = Author::new(UserId::new("u1")?, "Sam");
//! let place = Place::new(PlaceId::new("p1")?, "Bark Park", PlaceCategory::Park, author)?;
//! let list = build_top_picks(&[place], &HashMap::new(), Utc::now());
//!
//! assert_eq!(list.len(), 1);
//! assert_eq!(list.scores().next(), Some(0.0));
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

use std::collections::HashMap;
use std::hash::BuildHasher;

use chrono::{DateTime, Utc};
use log::debug;
use pawmap_core::{Place, PlaceId, PlaceScorer, RankedPlace, Review, TOP_PICKS_LIMIT, TopPicksList};

mod error;
mod types;

pub use error::ScoreWeightsError;
pub use types::{ALGORITHM_VERSION, RECENCY_WINDOW_SECS, ScoreWeights, TopPicksScorer};

/// Score a place from its reviews with the default weights.
///
/// Returns exactly `0.0` when `reviews` is empty; places without reviews
/// never rank above reviewed ones unless reports push those negative.
#[must_use]
pub fn compute_score(place: &Place, reviews: &[Review], now: DateTime<Utc>) -> f64 {
    ScoreWeights::default().score(place, reviews, now)
}

/// Rank places with the default scorer and keep the best 50.
///
/// Places missing from `reviews_by_place` are treated as having no reviews.
#[must_use]
pub fn build_top_picks<S: BuildHasher>(
    places: &[Place],
    reviews_by_place: &HashMap<PlaceId, Vec<Review>, S>,
    now: DateTime<Utc>,
) -> TopPicksList {
    build_top_picks_with(
        &TopPicksScorer::default(),
        places,
        reviews_by_place,
        now,
        TOP_PICKS_LIMIT,
    )
}

/// Rank places with `scorer` and keep the best `limit`.
///
/// Entries are sorted by descending score with a stable sort, so places
/// with equal scores keep their relative input order. Each entry's
/// `reviewCount` is the number of reviews supplied for it. The inputs are
/// not modified.
#[must_use]
pub fn build_top_picks_with<P, S>(
    scorer: &P,
    places: &[Place],
    reviews_by_place: &HashMap<PlaceId, Vec<Review>, S>,
    now: DateTime<Utc>,
    limit: usize,
) -> TopPicksList
where
    P: PlaceScorer + ?Sized,
    S: BuildHasher,
{
    let mut ranked: Vec<RankedPlace> = places
        .iter()
        .map(|place| {
            let reviews = reviews_by_place
                .get(&place.id)
                .map_or(&[][..], Vec::as_slice);
            let score = scorer.score(place, reviews, now);
            let review_count = u32::try_from(reviews.len()).unwrap_or(u32::MAX);
            debug!(
                "scored place {} at {score} from {review_count} reviews",
                place.id
            );
            RankedPlace::new(place.clone(), score, review_count)
        })
        .collect();

    ranked.sort_by(|a, b| b.top_picks_score.total_cmp(&a.top_picks_score));
    ranked.truncate(limit);

    TopPicksList {
        places: ranked,
        last_updated: now,
        algorithm_version: scorer.algorithm_version().to_owned(),
    }
}

/// Group a flat review collection by place, keeping input order within
/// each place.
#[must_use]
pub fn group_reviews_by_place<I>(reviews: I) -> HashMap<PlaceId, Vec<Review>>
where
    I: IntoIterator<Item = Review>,
{
    let mut grouped: HashMap<PlaceId, Vec<Review>> = HashMap::new();
    for review in reviews {
        grouped
            .entry(review.place_id.clone())
            .or_default()
            .push(review);
    }
    grouped
}

#[cfg(test)]
mod tests;
