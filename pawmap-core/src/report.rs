//! Reports filed against places by users.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{PlaceId, ReportId, UserId};

/// A user's report that a place listing is wrong or unsafe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Unique identifier.
    pub id: ReportId,
    /// Place being reported.
    pub place_id: PlaceId,
    /// Account that filed the report.
    pub reporter_id: UserId,
    /// Reason given by the reporter.
    pub reason: String,
    /// Whether a moderator has resolved the report.
    pub is_resolved: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl Report {
    /// Construct a new, unresolved report.
    #[must_use]
    pub fn new(
        id: ReportId,
        place_id: PlaceId,
        reporter_id: UserId,
        reason: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            place_id,
            reporter_id,
            reason: reason.into(),
            is_resolved: false,
            created_at,
        }
    }

    /// Mark the report resolved.
    #[must_use]
    pub fn resolved(mut self) -> Self {
        self.is_resolved = true;
        self
    }
}
