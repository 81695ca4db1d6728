//! Layered subcommand arguments and their resolved configurations.

use camino::Utf8PathBuf;
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use pawmap_core::{IdError, PlaceId, ReportId, UserId};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_OUTPUT, ARG_PLACE_ID, ARG_REASON, ARG_REPORT_ID, ARG_REPORTER, ARG_USER_ID, CliError,
    ENV_DELETE_USER_ID, ENV_RECOMPUTE_PLACE_ID, ENV_REPORT_PLACE_ID, ENV_REPORT_REASON,
    ENV_REPORT_REPORTER,
};

/// CLI arguments for the `top-picks` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "top-picks",
    long_about = "Rank every place by rating, review volume, recent activity, \
                 and report count, then replace the stored national list. \
                 The list can also be exported as pretty-printed JSON.",
    about = "Publish the national top-picks list"
)]
#[ortho_config(prefix = "PAWMAP")]
pub(crate) struct TopPicksArgs {
    /// Also write the published list to this JSON file.
    #[arg(long = ARG_OUTPUT, value_name = "path")]
    #[serde(default)]
    pub(crate) output: Option<Utf8PathBuf>,
}

impl TopPicksArgs {
    pub(crate) fn into_config(self) -> Result<TopPicksConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        Ok(TopPicksConfig::from(merged))
    }
}

/// Resolved `top-picks` configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TopPicksConfig {
    /// Export destination, when requested.
    pub(crate) output: Option<Utf8PathBuf>,
}

impl From<TopPicksArgs> for TopPicksConfig {
    fn from(args: TopPicksArgs) -> Self {
        Self {
            output: args.output,
        }
    }
}

/// CLI arguments for the `recompute-rating` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(name = "recompute-rating", about = "Refresh one place's rating")]
#[ortho_config(prefix = "PAWMAP")]
pub(crate) struct RecomputeRatingArgs {
    /// Identifier of the place to refresh.
    #[arg(value_name = "place-id")]
    #[serde(default)]
    pub(crate) place_id: Option<String>,
}

impl RecomputeRatingArgs {
    pub(crate) fn into_config(self) -> Result<RecomputeRatingConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        RecomputeRatingConfig::try_from(merged)
    }
}

/// Resolved `recompute-rating` configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RecomputeRatingConfig {
    pub(crate) place: PlaceId,
}

impl TryFrom<RecomputeRatingArgs> for RecomputeRatingConfig {
    type Error = CliError;

    fn try_from(args: RecomputeRatingArgs) -> Result<Self, Self::Error> {
        let place = required_id(
            args.place_id,
            ARG_PLACE_ID,
            ENV_RECOMPUTE_PLACE_ID,
            PlaceId::new,
        )?;
        Ok(Self { place })
    }
}

/// CLI arguments for the `report` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "report",
    long_about = "Store a report against a place. Once the place has five \
                 or more unresolved reports it is marked as needing review \
                 and every moderator is alerted.",
    about = "File a report against a place"
)]
#[ortho_config(prefix = "PAWMAP")]
pub(crate) struct ReportArgs {
    /// Identifier of the reported place.
    #[arg(value_name = "place-id")]
    #[serde(default)]
    pub(crate) place_id: Option<String>,
    /// User filing the report.
    #[arg(long = ARG_REPORTER, value_name = "user-id")]
    #[serde(default)]
    pub(crate) reporter: Option<String>,
    /// Why the place is being reported.
    #[arg(long = ARG_REASON, value_name = "text")]
    #[serde(default)]
    pub(crate) reason: Option<String>,
    /// Identifier for the new report; derived from the place and time when
    /// omitted.
    #[arg(long = ARG_REPORT_ID, value_name = "report-id")]
    #[serde(default)]
    pub(crate) id: Option<String>,
}

impl ReportArgs {
    pub(crate) fn into_config(self) -> Result<ReportConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ReportConfig::try_from(merged)
    }
}

/// Resolved `report` configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ReportConfig {
    pub(crate) place: PlaceId,
    pub(crate) reporter: UserId,
    pub(crate) reason: String,
    pub(crate) id: Option<ReportId>,
}

impl TryFrom<ReportArgs> for ReportConfig {
    type Error = CliError;

    fn try_from(args: ReportArgs) -> Result<Self, Self::Error> {
        let place = required_id(args.place_id, ARG_PLACE_ID, ENV_REPORT_PLACE_ID, PlaceId::new)?;
        let reporter = required_id(
            args.reporter,
            ARG_REPORTER,
            ENV_REPORT_REPORTER,
            UserId::new,
        )?;
        let reason = args.reason.ok_or(CliError::MissingArgument {
            field: ARG_REASON,
            env: ENV_REPORT_REASON,
        })?;
        let id = args
            .id
            .map(ReportId::new)
            .transpose()
            .map_err(|source| CliError::InvalidIdentifier {
                field: ARG_REPORT_ID,
                source,
            })?;
        Ok(Self {
            place,
            reporter,
            reason,
            id,
        })
    }
}

/// CLI arguments for the `delete-account` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "delete-account",
    long_about = "Delete the user's profile, statistics, preferences, and \
                 favourites, then reattribute their reviews and places to \
                 the deleted-user placeholder. Safe to re-run.",
    about = "Anonymize a deleted account"
)]
#[ortho_config(prefix = "PAWMAP")]
pub(crate) struct DeleteAccountArgs {
    /// Identifier of the deleted user.
    #[arg(value_name = "user-id")]
    #[serde(default)]
    pub(crate) user_id: Option<String>,
}

impl DeleteAccountArgs {
    pub(crate) fn into_config(self) -> Result<DeleteAccountConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        DeleteAccountConfig::try_from(merged)
    }
}

/// Resolved `delete-account` configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DeleteAccountConfig {
    pub(crate) user: UserId,
}

impl TryFrom<DeleteAccountArgs> for DeleteAccountConfig {
    type Error = CliError;

    fn try_from(args: DeleteAccountArgs) -> Result<Self, Self::Error> {
        let user = required_id(args.user_id, ARG_USER_ID, ENV_DELETE_USER_ID, UserId::new)?;
        Ok(Self { user })
    }
}

fn required_id<T>(
    value: Option<String>,
    field: &'static str,
    env: &'static str,
    parse: impl FnOnce(String) -> Result<T, IdError>,
) -> Result<T, CliError> {
    let raw = value.ok_or(CliError::MissingArgument { field, env })?;
    parse(raw).map_err(|source| CliError::InvalidIdentifier { field, source })
}

#[cfg(test)]
pub(crate) fn report_config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<ReportConfig, CliError> {
    let merged = ReportArgs::merge_from_layers(layers).map_err(CliError::from)?;
    ReportConfig::try_from(merged)
}
