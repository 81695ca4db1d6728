//! Error type shared by the batch jobs.

use chrono::{DateTime, Utc};
use pawmap_core::StoreError;
use thiserror::Error;

/// Failure of a batch job.
///
/// Malformed documents and undeliverable notifications are logged and
/// skipped rather than reported here; a `JobError` means the job produced
/// no result and left the previously stored state in place.
#[derive(Debug, Error)]
pub enum JobError {
    /// A store collaborator failed.
    #[error("{job} job failed")]
    Store {
        /// Job that was running.
        job: &'static str,
        /// Source error from the store.
        #[source]
        source: StoreError,
    },
    /// The retention cutoff fell outside the representable date range.
    #[error("cannot compute a report retention cutoff before {now}")]
    CutoffOutOfRange {
        /// Evaluation time the cutoff was derived from.
        now: DateTime<Utc>,
    },
}

impl JobError {
    /// Wrap a store failure raised while running `job`.
    pub(crate) fn store(job: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| Self::Store { job, source }
    }

    /// Report whether re-running the job later may succeed.
    ///
    /// # Examples
    /// ```
    /// use pawmap_core::StoreError;
    /// use pawmap_jobs::JobError;
    ///
    /// let err = JobError::Store {
    ///     job: "top picks",
    ///     source: StoreError::Unavailable {
    ///         operation: "fetch places",
    ///         reason: "timeout".to_owned(),
    ///     },
    /// };
    /// assert!(err.is_transient());
    /// ```
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Store { source, .. } => source.is_transient(),
            Self::CutoffOutOfRange { .. } => false,
        }
    }
}
