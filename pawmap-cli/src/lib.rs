//! Command-line interface for the PawMap maintenance jobs.
//!
//! Each subcommand runs one job against a `SQLite` database standing in for
//! the document store. Subcommand options are layered by `ortho_config`
//! (configuration files, `PAWMAP_*` environment variables, then flags).
#![forbid(unsafe_code)]

use std::io::Write;

use camino::Utf8PathBuf;
use chrono::{DateTime, SubsecRound, Utc};
use clap::{Parser, Subcommand};
use pawmap_core::{LogNotifier, ModeratorNotifier};

mod config;
mod dispatch;
mod error;
mod telemetry;

pub use error::CliError;
pub use telemetry::TelemetryError;

use config::{DeleteAccountArgs, RecomputeRatingArgs, ReportArgs, TopPicksArgs};

const ARG_DATABASE: &str = "database";
const ARG_LOG_LEVEL: &str = "log-level";
const ARG_OUTPUT: &str = "output";
const ARG_PLACE_ID: &str = "place-id";
const ARG_REASON: &str = "reason";
const ARG_REPORT_ID: &str = "id";
const ARG_REPORTER: &str = "reporter";
const ARG_USER_ID: &str = "user-id";
const ENV_DATABASE: &str = "PAWMAP_DATABASE";
const ENV_LOG_LEVEL: &str = "PAWMAP_LOG_LEVEL";
const ENV_RECOMPUTE_PLACE_ID: &str = "PAWMAP_CMDS_RECOMPUTE_RATING_PLACE_ID";
const ENV_REPORT_PLACE_ID: &str = "PAWMAP_CMDS_REPORT_PLACE_ID";
const ENV_REPORT_REASON: &str = "PAWMAP_CMDS_REPORT_REASON";
const ENV_REPORT_REPORTER: &str = "PAWMAP_CMDS_REPORT_REPORTER";
const ENV_DELETE_USER_ID: &str = "PAWMAP_CMDS_DELETE_ACCOUNT_USER_ID";
const DEFAULT_DATABASE: &str = "pawmap.db";
const DEFAULT_LOG_LEVEL: &str = "info";

/// Run the PawMap CLI with the current process arguments and environment.
///
/// Moderator alerts are written to the log.
///
/// # Errors
/// Returns [`CliError`] when arguments or configuration are invalid, the
/// database cannot be opened, or the selected job fails.
pub fn run() -> Result<(), CliError> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if !err.use_stderr() => return err.print().map_err(CliError::WriteOutput),
        Err(err) => return Err(CliError::ArgumentParsing(err)),
    };
    telemetry::init(&cli.log_level)?;
    let mut stdout = std::io::stdout().lock();
    run_with(cli, &LogNotifier, current_time(), &mut stdout)
}

/// The current time at the millisecond precision the store keeps.
fn current_time() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

fn run_with(
    cli: Cli,
    notifier: &dyn ModeratorNotifier,
    now: DateTime<Utc>,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let database = cli.database;
    match cli.command {
        Command::TopPicks(args) => {
            let config = args.into_config()?;
            let opened = dispatch::open_store(&database)?;
            dispatch::top_picks(&opened.store, &config, now, writer)
        }
        Command::RecomputeRating(args) => {
            let config = args.into_config()?;
            let opened = dispatch::open_store(&database)?;
            dispatch::recompute_rating(&opened.store, &config, writer)
        }
        Command::PruneReports => {
            let opened = dispatch::open_store(&database)?;
            dispatch::prune_reports(&opened.store, now, writer)
        }
        Command::Report(args) => {
            let config = args.into_config()?;
            let opened = dispatch::open_store(&database)?;
            dispatch::file_report(&opened.store, notifier, config, now, writer)
        }
        Command::DeleteAccount(args) => {
            let config = args.into_config()?;
            let opened = dispatch::open_store(&database)?;
            dispatch::delete_account(&opened.store, &config, writer)
        }
        Command::InitDb => dispatch::init_db(&database, writer),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "pawmap",
    about = "Maintenance jobs for the PawMap place directory",
    version
)]
struct Cli {
    /// Path to the `SQLite` database holding the PawMap collections.
    #[arg(
        long = ARG_DATABASE,
        env = ENV_DATABASE,
        value_name = "path",
        default_value = DEFAULT_DATABASE,
        global = true
    )]
    database: Utf8PathBuf,
    /// Log level or `tracing` filter directive; `RUST_LOG` takes precedence.
    #[arg(
        long = ARG_LOG_LEVEL,
        env = ENV_LOG_LEVEL,
        value_name = "filter",
        default_value = DEFAULT_LOG_LEVEL,
        global = true
    )]
    log_level: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Rank every place and publish the national top-picks list.
    TopPicks(TopPicksArgs),
    /// Recompute one place's average rating and review count.
    RecomputeRating(RecomputeRatingArgs),
    /// Delete resolved reports older than the retention period.
    PruneReports,
    /// File a report against a place and flag it once enough accumulate.
    Report(ReportArgs),
    /// Remove a deleted user's personal data and anonymize their content.
    DeleteAccount(DeleteAccountArgs),
    /// Create the database schema, or verify an existing one.
    InitDb,
}

#[cfg(test)]
mod tests;
