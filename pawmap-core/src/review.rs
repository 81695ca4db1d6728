//! Reviews left by visitors of a place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Author, PlaceId, ReviewId, UserId};

/// A whole-star rating between one and five.
///
/// # Examples
/// ```
/// use pawmap_core::Rating;
///
/// assert_eq!(Rating::new(4).map(Rating::get), Ok(4));
/// assert!(Rating::new(0).is_err());
/// assert!(Rating::new(6).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

/// Errors returned by [`Rating::new`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RatingError {
    /// The value fell outside `1..=5`.
    #[error("rating {value} must be between 1 and 5")]
    OutOfRange {
        /// Offending value.
        value: i64,
    },
}

impl Rating {
    /// Lowest permitted rating.
    pub const MIN: u8 = 1;
    /// Highest permitted rating.
    pub const MAX: u8 = 5;

    /// Validate and wrap a rating.
    ///
    /// # Errors
    /// Returns [`RatingError::OutOfRange`] when `value` is not in `1..=5`.
    pub fn new(value: u8) -> Result<Self, RatingError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(RatingError::OutOfRange {
                value: i64::from(value),
            })
        }
    }

    /// Return the rating value.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rating {
    type Error = RatingError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<i64> for Rating {
    type Error = RatingError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .map_err(|_| RatingError::OutOfRange { value })
            .and_then(Self::new)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

/// A visitor's review of a place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    /// Unique identifier.
    pub id: ReviewId,
    /// Place the review belongs to.
    pub place_id: PlaceId,
    /// Star rating.
    pub rating: Rating,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Account that wrote the review.
    pub author_id: UserId,
    /// Display name of the reviewer.
    pub author_name: String,
    /// Free-text body.
    #[serde(default)]
    pub comment: Option<String>,
}

impl Review {
    /// Construct a review without a comment.
    #[must_use]
    pub fn new(
        id: ReviewId,
        place_id: PlaceId,
        rating: Rating,
        created_at: DateTime<Utc>,
        author: Author,
    ) -> Self {
        Self {
            id,
            place_id,
            rating,
            created_at,
            author_id: author.id,
            author_name: author.name,
            comment: None,
        }
    }

    /// Attach a comment.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Attribution of the reviewer.
    #[must_use]
    pub fn author(&self) -> Author {
        Author::new(self.author_id.clone(), self.author_name.clone())
    }
}
