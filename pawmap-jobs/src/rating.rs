//! Aggregate star rating of a place.

use log::info;
use pawmap_core::{PlaceId, PlaceStore, Review, ReviewStore};

use crate::{JobError, keep_valid};

const JOB: &str = "rating refresh";

/// Rating aggregate written back to a place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingSummary {
    /// Mean star rating rounded to one decimal place, or `0.0` without
    /// reviews.
    pub rating: f64,
    /// Number of reviews the mean was taken over.
    pub review_count: u32,
}

/// Average `reviews` to one decimal place.
///
/// Halves round away from zero, so `[5, 4]` yields `4.5` and a mean of
/// `4.25` yields `4.3`.
///
/// # Examples
/// ```
/// use pawmap_jobs::recompute_rating;
///
/// let summary = recompute_rating(&[]);
/// assert_eq!(summary.review_count, 0);
/// assert!(summary.rating.abs() < f64::EPSILON);
/// ```
#[expect(
    clippy::float_arithmetic,
    clippy::cast_precision_loss,
    reason = "mean rating is rounded in floating point"
)]
#[must_use]
pub fn recompute_rating(reviews: &[Review]) -> RatingSummary {
    if reviews.is_empty() {
        return RatingSummary {
            rating: 0.0_f64,
            review_count: 0,
        };
    }
    let sum: u64 = reviews
        .iter()
        .map(|review| u64::from(review.rating.get()))
        .sum();
    let mean = sum as f64 / reviews.len() as f64;
    RatingSummary {
        rating: (mean * 10.0_f64).round() / 10.0_f64,
        review_count: u32::try_from(reviews.len()).unwrap_or(u32::MAX),
    }
}

/// Recompute and store the rating of `place` from its current reviews.
///
/// Run whenever a review of the place is added, edited, or removed. The job
/// is idempotent; malformed reviews are skipped.
///
/// # Errors
/// Returns [`JobError::Store`] when the reviews cannot be read or the place
/// cannot be updated (including when it no longer exists).
pub fn refresh_place_rating<S>(store: &S, place: &PlaceId) -> Result<RatingSummary, JobError>
where
    S: PlaceStore + ReviewStore + ?Sized,
{
    let fetched = store
        .reviews_for_place(place)
        .map_err(JobError::store(JOB))?;
    let reviews = keep_valid(JOB, fetched);
    let summary = recompute_rating(&reviews.records);
    store
        .update_rating(place, summary.rating, summary.review_count)
        .map_err(JobError::store(JOB))?;
    info!(
        "place {place} rated {} from {} reviews",
        summary.rating, summary.review_count
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use pawmap_core::test_support::MemoryStore;
    use pawmap_core::{
        Author, MalformedRecord, Place, PlaceCategory, Rating, ReviewId, StoreError, UserId,
    };
    use rstest::{fixture, rstest};

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 10, 8, 0, 0)
            .single()
            .unwrap_or_else(|| panic!("valid timestamp"))
    }

    fn author() -> Author {
        Author::new(
            UserId::new("u1").unwrap_or_else(|err| panic!("user id: {err}")),
            "Kim",
        )
    }

    fn place_id(raw: &str) -> PlaceId {
        PlaceId::new(raw).unwrap_or_else(|err| panic!("place id: {err}"))
    }

    fn reviews(place: &str, ratings: &[u8]) -> Vec<Review> {
        ratings
            .iter()
            .enumerate()
            .map(|(index, rating)| {
                Review::new(
                    ReviewId::new(format!("{place}-{index}"))
                        .unwrap_or_else(|err| panic!("review id: {err}")),
                    place_id(place),
                    Rating::new(*rating).unwrap_or_else(|err| panic!("rating: {err}")),
                    at(),
                    author(),
                )
            })
            .collect()
    }

    #[fixture]
    fn store() -> MemoryStore {
        let place = Place::new(place_id("p1"), "Dog Beach", PlaceCategory::Beach, author())
            .unwrap_or_else(|err| panic!("place: {err}"));
        MemoryStore::with_places([place])
    }

    #[rstest]
    #[case::whole(&[5, 4, 3], 4.0_f64, 3)]
    #[case::half(&[5, 4], 4.5_f64, 2)]
    #[case::rounds_half_up(&[5, 4, 4, 4], 4.3_f64, 4)]
    #[case::thirds(&[5, 5, 4], 4.7_f64, 3)]
    #[case::none(&[], 0.0_f64, 0)]
    fn averages_to_one_decimal(
        #[case] ratings: &[u8],
        #[case] expected: f64,
        #[case] count: u32,
    ) {
        let summary = recompute_rating(&reviews("p1", ratings));
        assert_eq!(summary.rating.to_bits(), expected.to_bits());
        assert_eq!(summary.review_count, count);
    }

    #[rstest]
    fn refresh_writes_rating_and_count(store: MemoryStore) {
        for review in reviews("p1", &[5, 4]) {
            store.add_review(review);
        }
        for review in reviews("p2", &[1]) {
            store.add_review(review);
        }

        let summary = refresh_place_rating(&store, &place_id("p1"))
            .unwrap_or_else(|err| panic!("refresh: {err}"));

        let stored = store
            .place(&place_id("p1"))
            .unwrap_or_else(|| panic!("place p1"));
        assert_eq!(stored.rating.to_bits(), 4.5_f64.to_bits());
        assert_eq!(stored.review_count, 2);
        assert_eq!(summary.review_count, 2);
    }

    #[rstest]
    fn refresh_is_idempotent(store: MemoryStore) {
        for review in reviews("p1", &[3, 4, 4]) {
            store.add_review(review);
        }
        let first = refresh_place_rating(&store, &place_id("p1"))
            .unwrap_or_else(|err| panic!("first refresh: {err}"));
        let second = refresh_place_rating(&store, &place_id("p1"))
            .unwrap_or_else(|err| panic!("second refresh: {err}"));
        assert_eq!(first, second);
    }

    #[rstest]
    fn refresh_skips_malformed_reviews(store: MemoryStore) {
        for review in reviews("p1", &[2]) {
            store.add_review(review);
        }
        store.add_malformed(MalformedRecord::new("reviews", "r-bad", "rating 0 out of range"));

        let summary = refresh_place_rating(&store, &place_id("p1"))
            .unwrap_or_else(|err| panic!("refresh: {err}"));

        assert_eq!(summary.review_count, 1);
    }

    #[rstest]
    fn refresh_of_missing_place_fails(store: MemoryStore) {
        let err = refresh_place_rating(&store, &place_id("gone"))
            .err()
            .unwrap_or_else(|| panic!("refresh of missing place should fail"));
        assert!(matches!(
            err,
            JobError::Store {
                source: StoreError::NotFound { .. },
                ..
            }
        ));
        assert!(!err.is_transient());
    }
}
