//! Job execution for each subcommand.

use std::io::Write;

use camino::Utf8Path;
use chrono::{DateTime, SecondsFormat, Utc};
use log::info;
use pawmap_core::{ModeratorNotifier, Report, ReportId, SqliteStore};
use pawmap_jobs::{
    ThresholdDecision, anonymize_account, handle_new_report, prune_stale_reports,
    publish_top_picks, refresh_place_rating,
};
use pawmap_scorer::TopPicksScorer;

use crate::CliError;
use crate::config::{DeleteAccountConfig, RecomputeRatingConfig, ReportConfig, TopPicksConfig};

/// A database opened for one command run.
pub(crate) struct OpenedStore {
    pub(crate) store: SqliteStore,
    /// The database file did not exist before this run.
    pub(crate) created: bool,
}

/// Open the database at `path`, creating it and its directory when missing.
pub(crate) fn open_store(path: &Utf8Path) -> Result<OpenedStore, CliError> {
    let existed = pawmap_fs::file_is_file(path).map_err(|source| CliError::InspectDatabase {
        path: path.to_path_buf(),
        source,
    })?;
    pawmap_fs::ensure_parent_dir(path).map_err(|source| CliError::CreateDatabaseDir {
        path: path.to_path_buf(),
        source,
    })?;
    let store =
        SqliteStore::open(path.as_std_path()).map_err(|source| CliError::OpenDatabase {
            path: path.to_path_buf(),
            source: Box::new(source),
        })?;
    Ok(OpenedStore {
        store,
        created: !existed,
    })
}

pub(crate) fn init_db(path: &Utf8Path, writer: &mut dyn Write) -> Result<(), CliError> {
    let opened = open_store(path)?;
    let verb = if opened.created { "created" } else { "verified" };
    info!("{verb} database schema at {path}");
    writeln!(writer, "{verb} database {path}").map_err(CliError::WriteOutput)
}

pub(crate) fn top_picks(
    store: &SqliteStore,
    config: &TopPicksConfig,
    now: DateTime<Utc>,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let list = publish_top_picks(store, &TopPicksScorer::default(), now)
        .map_err(CliError::job("top-picks"))?;
    writeln!(
        writer,
        "published {} top picks ({})",
        list.len(),
        list.algorithm_version
    )
    .map_err(CliError::WriteOutput)?;

    if let Some(path) = &config.output {
        let mut payload = serde_json::to_vec_pretty(&list).map_err(CliError::SerialiseTopPicks)?;
        payload.push(b'\n');
        pawmap_fs::write_replacing(path, &payload).map_err(|source| CliError::WriteExport {
            path: path.clone(),
            source,
        })?;
        writeln!(writer, "exported top picks to {path}").map_err(CliError::WriteOutput)?;
    }
    Ok(())
}

pub(crate) fn recompute_rating(
    store: &SqliteStore,
    config: &RecomputeRatingConfig,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let summary =
        refresh_place_rating(store, &config.place).map_err(CliError::job("recompute-rating"))?;
    writeln!(
        writer,
        "{}: rating {:.1} from {} reviews",
        config.place, summary.rating, summary.review_count
    )
    .map_err(CliError::WriteOutput)
}

pub(crate) fn prune_reports(
    store: &SqliteStore,
    now: DateTime<Utc>,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let outcome = prune_stale_reports(store, now).map_err(CliError::job("prune-reports"))?;
    writeln!(
        writer,
        "deleted {} resolved reports created before {}",
        outcome.deleted,
        outcome.cutoff.to_rfc3339_opts(SecondsFormat::Secs, true)
    )
    .map_err(CliError::WriteOutput)
}

pub(crate) fn file_report(
    store: &SqliteStore,
    notifier: &dyn ModeratorNotifier,
    config: ReportConfig,
    now: DateTime<Utc>,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let id = config
        .id
        .clone()
        .map_or_else(|| generated_report_id(&config, now), Ok)?;
    let report = Report::new(id, config.place, config.reporter, config.reason, now);
    let outcome =
        handle_new_report(store, notifier, &report, now).map_err(CliError::job("report"))?;

    let written = match outcome.decision {
        ThresholdDecision::Below { unresolved } => writeln!(
            writer,
            "filed report {} against {}: {unresolved} unresolved",
            report.id, report.place_id
        ),
        ThresholdDecision::Flag { unresolved } => writeln!(
            writer,
            "filed report {} against {}: {unresolved} unresolved, flagged for review \
             ({} moderators alerted, {} failed)",
            report.id, report.place_id, outcome.notified, outcome.failed
        ),
    };
    written.map_err(CliError::WriteOutput)
}

fn generated_report_id(config: &ReportConfig, now: DateTime<Utc>) -> Result<ReportId, CliError> {
    ReportId::new(format!(
        "{}-{}-{}",
        config.place,
        config.reporter,
        now.timestamp_millis()
    ))
    .map_err(|source| CliError::InvalidIdentifier {
        field: crate::ARG_REPORT_ID,
        source,
    })
}

pub(crate) fn delete_account(
    store: &SqliteStore,
    config: &DeleteAccountConfig,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let report =
        anonymize_account(store, &config.user).map_err(CliError::job("delete-account"))?;
    writeln!(
        writer,
        "anonymized {}: removed {} personal documents, reattributed {} reviews and {} places",
        config.user,
        report.purged.total(),
        report.reviews,
        report.places
    )
    .map_err(CliError::WriteOutput)
}
