//! Error types emitted by the PawMap CLI.
//!
//! Keep this error type reasonably small, as every command helper returns
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.
//! Large sources (store and job errors) are boxed.

use std::sync::Arc;

use camino::Utf8PathBuf;
use pawmap_core::{IdError, SchemaError};
use pawmap_jobs::JobError;
use thiserror::Error;

use crate::telemetry::TelemetryError;

/// Errors emitted by the PawMap CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        /// Flag or positional name.
        field: &'static str,
        /// Environment variable that can supply it.
        env: &'static str,
    },
    /// A document identifier supplied on the command line was blank.
    #[error("invalid {field}")]
    InvalidIdentifier {
        /// Flag or positional name.
        field: &'static str,
        /// Validation failure.
        #[source]
        source: IdError,
    },
    /// The log subscriber could not be installed.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    /// The database path could not be inspected.
    #[error("failed to inspect database path {path:?}")]
    InspectDatabase {
        /// Configured database path.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// The directory that should hold the database could not be created.
    #[error("failed to create the directory for database {path:?}")]
    CreateDatabaseDir {
        /// Configured database path.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// The database could not be opened or its schema applied.
    #[error("failed to open database {path:?}")]
    OpenDatabase {
        /// Configured database path.
        path: Utf8PathBuf,
        /// Schema or connection failure.
        #[source]
        source: Box<SchemaError>,
    },
    /// A maintenance job failed.
    #[error("{command} failed")]
    Job {
        /// Subcommand that ran the job.
        command: &'static str,
        /// Job failure.
        #[source]
        source: Box<JobError>,
    },
    /// The top-picks list could not be serialised for export.
    #[error("failed to serialise the top-picks list")]
    SerialiseTopPicks(#[source] serde_json::Error),
    /// The exported top-picks list could not be written.
    #[error("failed to write top-picks export {path:?}")]
    WriteExport {
        /// Export destination.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// The command summary could not be written to stdout.
    #[error("failed to write command output")]
    WriteOutput(#[source] std::io::Error),
}

impl CliError {
    /// Wrap a job failure raised by `command`.
    pub(crate) fn job(command: &'static str) -> impl FnOnce(JobError) -> Self {
        move |source| Self::Job {
            command,
            source: Box::new(source),
        }
    }

    /// Report whether re-running the command later may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Job { source, .. } if source.is_transient())
    }
}
