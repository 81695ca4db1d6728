//! Clean-up after a user deletes their account.

use log::info;
use pawmap_core::{AccountPurge, AccountStore, Author, PlaceStore, ReviewStore, UserId};

use crate::{JobError, keep_valid};

const JOB: &str = "account anonymization";

/// Documents touched while anonymizing an account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnonymizationReport {
    /// Personal documents deleted.
    pub purged: AccountPurge,
    /// Reviews reattributed to the deleted-user sentinel.
    pub reviews: usize,
    /// Places reattributed to the deleted-user sentinel.
    pub places: usize,
    /// Malformed documents skipped.
    pub skipped: usize,
}

/// Remove `user`'s personal documents and anonymize their contributions.
///
/// Profile, statistics, preferences, and favourites are deleted. Reviews and
/// places the user authored keep their content but are reattributed to the
/// `deleted_user` sentinel. Running the job again finds nothing left to do.
///
/// # Errors
/// Returns [`JobError::Store`] when a collection cannot be read or a
/// document cannot be updated. Documents processed before the failure stay
/// processed, so the job can simply be re-run.
pub fn anonymize_account<S>(store: &S, user: &UserId) -> Result<AnonymizationReport, JobError>
where
    S: AccountStore + ReviewStore + PlaceStore + ?Sized,
{
    let sentinel = Author::deleted();
    let purged = store.purge_account(user).map_err(JobError::store(JOB))?;

    let reviews = keep_valid(
        JOB,
        store.reviews_by_author(user).map_err(JobError::store(JOB))?,
    );
    for review in &reviews.records {
        store
            .reattribute_review(&review.id, &sentinel)
            .map_err(JobError::store(JOB))?;
    }

    let places = keep_valid(
        JOB,
        store.places_created_by(user).map_err(JobError::store(JOB))?,
    );
    for place in &places.records {
        store
            .reattribute_place(&place.id, &sentinel)
            .map_err(JobError::store(JOB))?;
    }

    let report = AnonymizationReport {
        purged,
        reviews: reviews.records.len(),
        places: places.records.len(),
        skipped: reviews.skipped + places.skipped,
    };
    info!(
        "anonymized account {user}: {} personal documents removed, {} reviews and {} places reattributed",
        purged.total(),
        report.reviews,
        report.places
    );
    Ok(report)
}
