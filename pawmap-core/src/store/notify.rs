//! Moderator notification channel.
//!
//! Delivery (email, push) is owned by an external service; the trait only
//! describes the hand-off.

use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{PlaceId, UserId};

/// Alert raised when a place accumulates too many unresolved reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationAlert {
    /// Place that crossed the threshold.
    pub place_id: PlaceId,
    /// Unresolved reports counted when the alert was raised.
    pub report_count: usize,
}

/// Failure to hand an alert to the delivery channel.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("failed to notify moderator {moderator}: {reason}")]
pub struct NotifyError {
    /// Moderator who could not be reached.
    pub moderator: UserId,
    /// Description of the failure.
    pub reason: String,
}

/// Deliver moderation alerts.
pub trait ModeratorNotifier {
    /// Send `alert` to `moderator`.
    ///
    /// # Errors
    /// Returns [`NotifyError`] when the alert could not be handed off.
    fn notify(&self, moderator: &UserId, alert: &ModerationAlert) -> Result<(), NotifyError>;
}

/// Notifier that records alerts in the log instead of delivering them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl ModeratorNotifier for LogNotifier {
    fn notify(&self, moderator: &UserId, alert: &ModerationAlert) -> Result<(), NotifyError> {
        info!(
            "place {} needs review ({} unresolved reports); notifying moderator {moderator}",
            alert.place_id, alert.report_count
        );
        Ok(())
    }
}
