//! Log output for the `pawmap` binary.
//!
//! Library crates log through the `log` facade; the subscriber installed
//! here bridges those records and writes them to stderr.

use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::ParseError;

/// Failures raised while installing the log subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The configured level or filter directive did not parse.
    #[error("invalid log level/filter {value:?}")]
    Filter {
        /// Rejected directive.
        value: String,
        /// Parser failure.
        #[source]
        source: ParseError,
    },
    /// A global subscriber or `log` bridge was already installed.
    #[error("failed to install the log subscriber")]
    Install(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Install the stderr subscriber.
///
/// `RUST_LOG` wins when set and valid; otherwise `fallback` is used.
pub(crate) fn init(fallback: &str) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| parse_filter(fallback))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init()
        .map_err(TelemetryError::Install)
}

pub(crate) fn parse_filter(value: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(value).map_err(|source| TelemetryError::Filter {
        value: value.to_owned(),
        source,
    })
}
