//! Ranked output documents produced by the top-picks job.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Place;

/// Document key of the nationwide top-picks list.
pub const NATIONAL_TOP_PICKS: &str = "national";

/// Maximum number of entries kept in a top-picks list.
pub const TOP_PICKS_LIMIT: usize = 50;

/// A place together with the score that ranked it.
///
/// Serialises as the place's own fields plus `topPicksScore`. The
/// `reviewCount` field carries the number of reviews seen at computation
/// time rather than the stored aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedPlace {
    /// Place fields, with `review_count` replaced by the computed count.
    #[serde(flatten)]
    pub place: Place,
    /// Score assigned by the ranking formula.
    pub top_picks_score: f64,
}

impl RankedPlace {
    /// Pair a place with its computed score and review count.
    #[must_use]
    pub fn new(mut place: Place, top_picks_score: f64, review_count: u32) -> Self {
        place.review_count = review_count;
        Self {
            place,
            top_picks_score,
        }
    }

    /// Number of reviews the score was computed from.
    #[must_use]
    pub const fn review_count(&self) -> u32 {
        self.place.review_count
    }
}

/// A bounded, descending list of the best places.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopPicksList {
    /// Ranked entries, best first.
    pub places: Vec<RankedPlace>,
    /// When the list was computed.
    pub last_updated: DateTime<Utc>,
    /// Tag naming the formula that produced the scores.
    pub algorithm_version: String,
}

impl TopPicksList {
    /// Number of ranked entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.places.len()
    }

    /// Report whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }

    /// Iterate over the scores in rank order.
    pub fn scores(&self) -> impl Iterator<Item = f64> + '_ {
        self.places.iter().map(|entry| entry.top_picks_score)
    }
}
