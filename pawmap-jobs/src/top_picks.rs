//! Scheduled recomputation of the national top-picks list.

use chrono::{DateTime, Utc};
use log::info;
use pawmap_core::{
    NATIONAL_TOP_PICKS, PlaceScorer, PlaceStore, ReviewStore, TOP_PICKS_LIMIT, TopPicksList,
    TopPicksStore,
};
use pawmap_scorer::{build_top_picks_with, group_reviews_by_place};

use crate::{JobError, keep_valid};

const JOB: &str = "top picks";

/// Rank every place with `scorer` and overwrite the national list.
///
/// Malformed places and reviews are logged and left out of the ranking.
/// The stored document is only replaced once the new list is complete.
///
/// # Errors
/// Returns [`JobError::Store`] when places or reviews cannot be read or the
/// list cannot be written; the previously published list is then kept.
pub fn publish_top_picks<S, P>(
    store: &S,
    scorer: &P,
    now: DateTime<Utc>,
) -> Result<TopPicksList, JobError>
where
    S: PlaceStore + ReviewStore + TopPicksStore + ?Sized,
    P: PlaceScorer + ?Sized,
{
    let places = keep_valid(JOB, store.fetch_places().map_err(JobError::store(JOB))?);
    let reviews = keep_valid(JOB, store.fetch_reviews().map_err(JobError::store(JOB))?);
    let review_total = reviews.records.len();
    let grouped = group_reviews_by_place(reviews.records);

    let list = build_top_picks_with(scorer, &places.records, &grouped, now, TOP_PICKS_LIMIT);
    store
        .replace_top_picks(NATIONAL_TOP_PICKS, &list)
        .map_err(JobError::store(JOB))?;

    info!(
        "published {} top picks from {} places and {review_total} reviews ({} malformed skipped)",
        list.len(),
        places.records.len(),
        places.skipped + reviews.skipped
    );
    Ok(list)
}
