//! Removal of resolved reports past their retention period.

use chrono::{DateTime, Months, Utc};
use log::info;
use pawmap_core::{Report, ReportId, ReportStore};

use crate::{JobError, keep_valid};

const JOB: &str = "report pruning";

/// Calendar months a resolved report is retained.
pub const REPORT_RETENTION_MONTHS: u32 = 6;

/// Outcome of a pruning run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PruneReport {
    /// Reports deleted.
    pub deleted: usize,
    /// Malformed report documents skipped.
    pub skipped: usize,
    /// Reports created before this instant were eligible.
    pub cutoff: DateTime<Utc>,
}

/// Instant six calendar months before `now`.
///
/// Days past the end of the target month clamp to its last day, so the
/// cutoff for 31 August is 29 February in a leap year. Returns `None` when
/// the result would precede the earliest representable date.
///
/// # Examples
/// ```
/// use chrono::{TimeZone, Utc};
/// use pawmap_jobs::stale_report_cutoff;
///
/// let now = Utc.with_ymd_and_hms(2024, 8, 31, 0, 0, 0).unwrap();
/// let cutoff = Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap();
/// assert_eq!(stale_report_cutoff(now), Some(cutoff));
/// ```
#[must_use]
pub fn stale_report_cutoff(now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    now.checked_sub_months(Months::new(REPORT_RETENTION_MONTHS))
}

/// Reports that are resolved and were created strictly before `cutoff`.
///
/// Unresolved reports are never selected, whatever their age.
#[must_use]
pub fn select_stale_reports(reports: &[Report], cutoff: DateTime<Utc>) -> Vec<&Report> {
    reports
        .iter()
        .filter(|report| report.is_resolved && report.created_at < cutoff)
        .collect()
}

/// Delete resolved reports older than six months as a single batch.
///
/// # Errors
/// Returns [`JobError::CutoffOutOfRange`] when no cutoff can be computed
/// for `now`, and [`JobError::Store`] when the reports cannot be read or the
/// batch delete fails. A failed delete removes nothing.
pub fn prune_stale_reports<S>(store: &S, now: DateTime<Utc>) -> Result<PruneReport, JobError>
where
    S: ReportStore + ?Sized,
{
    let cutoff = stale_report_cutoff(now).ok_or(JobError::CutoffOutOfRange { now })?;
    let fetched = store
        .resolved_reports_before(cutoff)
        .map_err(JobError::store(JOB))?;
    let candidates = keep_valid(JOB, fetched);
    let stale: Vec<ReportId> = select_stale_reports(&candidates.records, cutoff)
        .into_iter()
        .map(|report| report.id.clone())
        .collect();

    let deleted = if stale.is_empty() {
        0
    } else {
        store.delete_reports(&stale).map_err(JobError::store(JOB))?
    };
    info!("pruned {deleted} resolved reports created before {cutoff}");
    Ok(PruneReport {
        deleted,
        skipped: candidates.skipped,
        cutoff,
    })
}
