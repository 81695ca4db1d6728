//! Facade crate for the PawMap place-scoring and maintenance engine.
//!
//! This crate re-exports the domain records and collaborator traits, the
//! top-picks scoring engine, and the maintenance jobs. The `SQLite` store is
//! available behind the default `store-sqlite` feature.

#![forbid(unsafe_code)]

pub use pawmap_core::{
    AccountPurge, AccountStore, Author, DELETED_USER, Fetched, IdError, LogNotifier,
    MalformedRecord, ModerationAlert, ModeratorNotifier, NATIONAL_TOP_PICKS, NotifyError, Place,
    PlaceCategory, PlaceError, PlaceId, PlaceScorer, PlaceStore, RankedPlace, Rating, RatingError,
    Report, ReportId, ReportStore, Review, ReviewId, ReviewStore, StoreError, TOP_PICKS_LIMIT,
    TopPicksList, TopPicksStore, UserId,
};

#[cfg(feature = "store-sqlite")]
pub use pawmap_core::{SchemaError, SqliteStore};

pub use pawmap_jobs::{
    AnonymizationReport, FlagOutcome, JobError, PruneReport, REPORT_RETENTION_MONTHS,
    REPORT_THRESHOLD, RatingSummary, ThresholdDecision, anonymize_account,
    evaluate_report_threshold, handle_new_report, prune_stale_reports, publish_top_picks,
    recompute_rating, refresh_place_rating, select_stale_reports, stale_report_cutoff,
};

pub use pawmap_scorer::{
    ALGORITHM_VERSION, RECENCY_WINDOW_SECS, ScoreWeights, ScoreWeightsError, TopPicksScorer,
    build_top_picks, build_top_picks_with, compute_score, group_reviews_by_place,
};
