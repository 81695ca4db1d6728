//! Escalation of heavily reported places to moderators.

use chrono::{DateTime, Utc};
use log::{info, warn};
use pawmap_core::{
    AccountStore, ModerationAlert, ModeratorNotifier, PlaceStore, Report, ReportStore,
};

use crate::{JobError, keep_valid};

const JOB: &str = "report flagging";

/// Unresolved reports at which a place is flagged for review.
pub const REPORT_THRESHOLD: usize = 5;

/// Whether a place's unresolved report count warrants moderation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdDecision {
    /// The count is below [`REPORT_THRESHOLD`].
    Below {
        /// Unresolved reports counted.
        unresolved: usize,
    },
    /// The count has reached [`REPORT_THRESHOLD`].
    Flag {
        /// Unresolved reports counted.
        unresolved: usize,
    },
}

impl ThresholdDecision {
    /// Report whether the place should be flagged.
    #[must_use]
    pub const fn should_flag(self) -> bool {
        matches!(self, Self::Flag { .. })
    }
}

/// Decide whether `unresolved` reports reach the moderation threshold.
///
/// # Examples
/// ```
/// use pawmap_jobs::evaluate_report_threshold;
///
/// assert!(!evaluate_report_threshold(4).should_flag());
/// assert!(evaluate_report_threshold(5).should_flag());
/// ```
#[must_use]
pub const fn evaluate_report_threshold(unresolved: usize) -> ThresholdDecision {
    if unresolved >= REPORT_THRESHOLD {
        ThresholdDecision::Flag { unresolved }
    } else {
        ThresholdDecision::Below { unresolved }
    }
}

/// What happened after a report was filed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagOutcome {
    /// Threshold decision for the place, including the new report.
    pub decision: ThresholdDecision,
    /// Moderators who received the alert.
    pub notified: usize,
    /// Moderators whose alert could not be delivered.
    pub failed: usize,
}

/// File `report` and escalate its place when the threshold is reached.
///
/// The report is persisted first (which also bumps the place's report
/// count), then the place's unresolved reports are counted. At or above
/// [`REPORT_THRESHOLD`] the place is marked as needing review at `now` and
/// every registered moderator is sent a [`ModerationAlert`]. Each qualifying
/// report triggers exactly one such escalation, so a place already under
/// review is flagged again with the later time. Undeliverable alerts are
/// logged and counted; they do not stop delivery to other moderators.
///
/// # Errors
/// Returns [`JobError::Store`] when the report cannot be stored, the
/// reports or moderators cannot be read, or the place cannot be flagged.
pub fn handle_new_report<S, N>(
    store: &S,
    notifier: &N,
    report: &Report,
    now: DateTime<Utc>,
) -> Result<FlagOutcome, JobError>
where
    S: ReportStore + PlaceStore + AccountStore + ?Sized,
    N: ModeratorNotifier + ?Sized,
{
    store.create_report(report).map_err(JobError::store(JOB))?;
    let fetched = store
        .unresolved_reports_for_place(&report.place_id)
        .map_err(JobError::store(JOB))?;
    let unresolved = keep_valid(JOB, fetched).records.len();

    let decision = evaluate_report_threshold(unresolved);
    let mut outcome = FlagOutcome {
        decision,
        notified: 0,
        failed: 0,
    };
    if !decision.should_flag() {
        return Ok(outcome);
    }

    store
        .flag_for_review(&report.place_id, now)
        .map_err(JobError::store(JOB))?;
    let alert = ModerationAlert {
        place_id: report.place_id.clone(),
        report_count: unresolved,
    };
    for moderator in store.moderators().map_err(JobError::store(JOB))? {
        match notifier.notify(&moderator, &alert) {
            Ok(()) => outcome.notified += 1,
            Err(err) => {
                warn!("{JOB}: {err}");
                outcome.failed += 1;
            }
        }
    }
    info!(
        "place {} flagged with {unresolved} unresolved reports; {} moderators notified, {} failed",
        report.place_id, outcome.notified, outcome.failed
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use pawmap_core::test_support::{MemoryStore, RecordingNotifier};
    use pawmap_core::{Author, Place, PlaceCategory, PlaceId, ReportId, StoreError, UserId};
    use rstest::{fixture, rstest};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 2, 14, 0, 0)
            .single()
            .unwrap_or_else(|| panic!("valid timestamp"))
    }

    fn user(raw: &str) -> UserId {
        UserId::new(raw).unwrap_or_else(|err| panic!("user id: {err}"))
    }

    fn place_id() -> PlaceId {
        PlaceId::new("p1").unwrap_or_else(|err| panic!("place id: {err}"))
    }

    fn report(index: usize) -> Report {
        report_at(index, now())
    }

    fn report_at(index: usize, created_at: DateTime<Utc>) -> Report {
        Report::new(
            ReportId::new(format!("report-{index}")).unwrap_or_else(|err| panic!("id: {err}")),
            place_id(),
            user(&format!("reporter-{index}")),
            "fence is broken",
            created_at,
        )
    }

    #[fixture]
    fn store() -> MemoryStore {
        let place = Place::new(
            place_id(),
            "Riverside Trail",
            PlaceCategory::Trail,
            Author::new(user("founder"), "Jo"),
        )
        .unwrap_or_else(|err| panic!("place: {err}"));
        let seeded = MemoryStore::with_places([place]);
        seeded.add_moderator(user("mod-a"));
        seeded.add_moderator(user("mod-b"));
        seeded
    }

    fn file_reports(
        store: &MemoryStore,
        notifier: &RecordingNotifier,
        count: usize,
    ) -> Vec<FlagOutcome> {
        (1..=count)
            .map(|index| {
                handle_new_report(store, notifier, &report(index), now())
                    .unwrap_or_else(|err| panic!("report {index}: {err}"))
            })
            .collect()
    }

    #[rstest]
    #[case(0, false)]
    #[case(4, false)]
    #[case(5, true)]
    #[case(12, true)]
    fn threshold_is_inclusive(#[case] unresolved: usize, #[case] flagged: bool) {
        assert_eq!(evaluate_report_threshold(unresolved).should_flag(), flagged);
    }

    #[rstest]
    fn fourth_report_does_not_flag(store: MemoryStore) {
        let notifier = RecordingNotifier::default();

        let outcomes = file_reports(&store, &notifier, 4);

        assert!(outcomes.iter().all(|outcome| !outcome.decision.should_flag()));
        let stored = store.place(&place_id()).unwrap_or_else(|| panic!("place"));
        assert!(!stored.needs_review);
        assert_eq!(stored.report_count, 4);
        assert!(notifier.sent().is_empty());
    }

    #[rstest]
    fn fifth_report_flags_once_and_alerts_every_moderator(store: MemoryStore) {
        let notifier = RecordingNotifier::default();

        let outcomes = file_reports(&store, &notifier, 5);

        let flagged = outcomes
            .iter()
            .filter(|outcome| outcome.decision.should_flag())
            .count();
        assert_eq!(flagged, 1);
        let stored = store.place(&place_id()).unwrap_or_else(|| panic!("place"));
        assert!(stored.needs_review);
        assert_eq!(stored.flagged_at, Some(now()));
        let recipients: Vec<String> = notifier
            .sent()
            .into_iter()
            .map(|(moderator, alert)| {
                assert_eq!(alert.report_count, 5);
                moderator.to_string()
            })
            .collect();
        assert_eq!(recipients, ["mod-a", "mod-b"]);
    }

    #[rstest]
    fn every_report_past_the_threshold_flags_again(store: MemoryStore) {
        let notifier = RecordingNotifier::default();
        let filed_at = |index: u8| now() + Duration::hours(i64::from(index));

        for index in 1..=7 {
            let at = filed_at(index);
            handle_new_report(&store, &notifier, &report_at(usize::from(index), at), at)
                .unwrap_or_else(|err| panic!("report {index}: {err}"));
        }

        let stored = store.place(&place_id()).unwrap_or_else(|| panic!("place"));
        assert!(stored.needs_review);
        assert_eq!(stored.flagged_at, Some(filed_at(7)));
        let sent = notifier.sent();
        for moderator in ["mod-a", "mod-b"] {
            let alerts = sent
                .iter()
                .filter(|(recipient, _)| recipient.as_str() == moderator)
                .count();
            assert_eq!(alerts, 3, "alerts for {moderator}");
        }
        let counts: Vec<usize> = sent.iter().map(|(_, alert)| alert.report_count).collect();
        assert_eq!(counts, [5, 5, 6, 6, 7, 7]);
    }

    #[rstest]
    fn resolved_reports_do_not_count(store: MemoryStore) {
        let notifier = RecordingNotifier::default();
        for index in 10..14 {
            store.add_report(report(index).resolved());
        }

        let outcomes = file_reports(&store, &notifier, 4);

        assert!(outcomes.iter().all(|outcome| !outcome.decision.should_flag()));
    }

    #[rstest]
    fn failed_delivery_does_not_stop_other_alerts(store: MemoryStore) {
        let notifier = RecordingNotifier::default();
        notifier.reject(user("mod-a"));
        file_reports(&store, &notifier, 4);

        let outcome = handle_new_report(&store, &notifier, &report(5), now())
            .unwrap_or_else(|err| panic!("fifth report: {err}"));

        assert_eq!(outcome.notified, 1);
        assert_eq!(outcome.failed, 1);
        assert_eq!(notifier.sent().len(), 1);
    }

    #[rstest]
    fn report_for_unknown_place_is_rejected() {
        let store = MemoryStore::default();
        let notifier = RecordingNotifier::default();

        let err = handle_new_report(&store, &notifier, &report(1), now())
            .err()
            .unwrap_or_else(|| panic!("unknown place should fail"));

        assert!(matches!(
            err,
            JobError::Store {
                source: StoreError::NotFound { .. },
                ..
            }
        ));
        assert!(store.reports().is_empty());
    }
}
