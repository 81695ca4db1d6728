//! Batch jobs that keep PawMap's derived data consistent.
//!
//! Each job is a synchronous function over explicit store collaborators:
//!
//! - [`publish_top_picks`] ranks every place and overwrites the national
//!   top-picks document.
//! - [`refresh_place_rating`] recomputes one place's average rating.
//! - [`prune_stale_reports`] deletes resolved reports older than six months.
//! - [`handle_new_report`] files a report and flags the place for moderation
//!   once enough unresolved reports accumulate.
//! - [`anonymize_account`] removes a deleted user's personal documents and
//!   detaches their name from the content they contributed.
//!
//! Jobs are idempotent and never retry. Malformed documents are logged at
//! `warn` and skipped so one bad record cannot block a batch; store failures
//! surface as [`JobError`], whose [`JobError::is_transient`] tells the
//! scheduler whether a later re-run may succeed.

#![forbid(unsafe_code)]

use log::warn;
use pawmap_core::MalformedRecord;

mod anonymize;
mod error;
mod flagging;
mod pruning;
mod rating;
mod top_picks;

pub use anonymize::{AnonymizationReport, anonymize_account};
pub use error::JobError;
pub use flagging::{
    FlagOutcome, REPORT_THRESHOLD, ThresholdDecision, evaluate_report_threshold,
    handle_new_report,
};
pub use pruning::{
    PruneReport, REPORT_RETENTION_MONTHS, prune_stale_reports, select_stale_reports,
    stale_report_cutoff,
};
pub use rating::{RatingSummary, recompute_rating, refresh_place_rating};
pub use top_picks::publish_top_picks;

/// Records that decoded cleanly, plus how many were skipped.
struct Valid<T> {
    records: Vec<T>,
    skipped: usize,
}

/// Drop malformed documents from a fetch, logging each one.
fn keep_valid<T>(job: &'static str, fetched: Vec<Result<T, MalformedRecord>>) -> Valid<T> {
    let mut records = Vec::with_capacity(fetched.len());
    let mut skipped = 0_usize;
    for entry in fetched {
        match entry {
            Ok(record) => records.push(record),
            Err(malformed) => {
                warn!("{job}: skipping {malformed}");
                skipped += 1;
            }
        }
    }
    Valid { records, skipped }
}
