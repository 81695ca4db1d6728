//! Public configuration types for top-picks scoring.
#![forbid(unsafe_code)]

use chrono::{DateTime, TimeDelta, Utc};
use pawmap_core::{Place, PlaceScorer, Review};

use crate::error::ScoreWeightsError;

/// Tag published with lists ranked by the default formula.
pub const ALGORITHM_VERSION: &str = "rating_review_volume";

/// Width of the recency window: thirty 24-hour days.
pub const RECENCY_WINDOW_SECS: i64 = 30 * 24 * 60 * 60;

/// Tunable weights applied to the ranking signals.
///
/// The defaults reproduce the production formula exactly; change them only
/// together with the published [`TopPicksScorer::algorithm_version`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    /// Multiplier applied to `ln(review_count + 1)`.
    pub volume_weight: f64,
    /// Multiplier applied to the fraction of reviews inside the recency
    /// window.
    pub recency_weight: f64,
    /// Additive bonus for verified places.
    pub verification_bonus: f64,
    /// Penalty subtracted per report filed against a place.
    pub report_penalty: f64,
    /// Reviews younger than this count as recent.
    pub recency_window: TimeDelta,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            volume_weight: 0.5_f64,
            recency_weight: 0.3_f64,
            verification_bonus: 0.2_f64,
            report_penalty: 0.1_f64,
            recency_window: TimeDelta::seconds(RECENCY_WINDOW_SECS),
        }
    }
}

impl ScoreWeights {
    /// Validate the weights and return a copy.
    ///
    /// # Errors
    /// Returns [`ScoreWeightsError::InvalidWeight`] when a weight is negative
    /// or not finite, and [`ScoreWeightsError::EmptyRecencyWindow`] when the
    /// window is not positive.
    pub fn validate(self) -> Result<Self, ScoreWeightsError> {
        for (name, value) in [
            ("volume_weight", self.volume_weight),
            ("recency_weight", self.recency_weight),
            ("verification_bonus", self.verification_bonus),
            ("report_penalty", self.report_penalty),
        ] {
            if !value.is_finite() || value < 0.0_f64 {
                return Err(ScoreWeightsError::InvalidWeight { name, value });
            }
        }
        if self.recency_window <= TimeDelta::zero() {
            return Err(ScoreWeightsError::EmptyRecencyWindow);
        }
        Ok(self)
    }

    /// Score `place` from `reviews` as of `now`.
    ///
    /// Returns exactly `0.0` when there are no reviews. Otherwise the score is
    /// the mean rating plus a logarithmic volume bonus, a recency bonus
    /// proportional to the share of reviews inside the window, and a
    /// verification bonus, minus a linear, unbounded report penalty.
    /// Reviews dated after `now` count as recent.
    #[expect(
        clippy::float_arithmetic,
        clippy::cast_precision_loss,
        reason = "ranking blends floating-point signals derived from review counts"
    )]
    #[must_use]
    pub fn score(&self, place: &Place, reviews: &[Review], now: DateTime<Utc>) -> f64 {
        if reviews.is_empty() {
            return 0.0_f64;
        }
        let count = reviews.len() as f64;
        let rating_sum: u64 = reviews
            .iter()
            .map(|review| u64::from(review.rating.get()))
            .sum();
        let average_rating = rating_sum as f64 / count;

        let volume_bonus = (count + 1.0_f64).ln() * self.volume_weight;

        let recent = reviews
            .iter()
            .filter(|review| now.signed_duration_since(review.created_at) < self.recency_window)
            .count();
        let recency_bonus = (recent as f64 / count) * self.recency_weight;

        let verification_bonus = if place.is_verified {
            self.verification_bonus
        } else {
            0.0_f64
        };
        let report_penalty = f64::from(place.report_count) * self.report_penalty;

        average_rating + volume_bonus + recency_bonus + verification_bonus - report_penalty
    }
}

/// [`PlaceScorer`] applying [`ScoreWeights`] under a published tag.
///
/// # Examples
///
/// ```
/// use pawmap_core::PlaceScorer;
/// use pawmap_scorer::{ALGORITHM_VERSION, TopPicksScorer};
///
/// let scorer = TopPicksScorer::default();
/// assert_eq!(scorer.algorithm_version(), ALGORITHM_VERSION);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TopPicksScorer {
    weights: ScoreWeights,
    algorithm_version: String,
}

impl TopPicksScorer {
    /// Build a scorer from validated weights and a tag naming them.
    ///
    /// # Errors
    /// Returns [`ScoreWeightsError`] when the weights are invalid or the tag
    /// is blank.
    pub fn new(
        weights: ScoreWeights,
        algorithm_version: impl Into<String>,
    ) -> Result<Self, ScoreWeightsError> {
        let algorithm_version = algorithm_version.into();
        if algorithm_version.trim().is_empty() {
            return Err(ScoreWeightsError::BlankAlgorithmVersion);
        }
        Ok(Self {
            weights: weights.validate()?,
            algorithm_version,
        })
    }

    /// Weights applied by this scorer.
    #[must_use]
    pub const fn weights(&self) -> &ScoreWeights {
        &self.weights
    }
}

impl Default for TopPicksScorer {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            algorithm_version: ALGORITHM_VERSION.to_owned(),
        }
    }
}

impl PlaceScorer for TopPicksScorer {
    fn score(&self, place: &Place, reviews: &[Review], now: DateTime<Utc>) -> f64 {
        self.weights.score(place, reviews, now)
    }

    fn algorithm_version(&self) -> &str {
        &self.algorithm_version
    }
}
