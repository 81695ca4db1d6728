//! Places people can take their dogs.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{DELETED_USER, PlaceId, UserId};

/// Upper bound of the five-star rating scale.
pub const MAX_RATING: f64 = 5.0;

/// Kind of venue a place represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceCategory {
    /// Off-leash or on-leash park.
    Park,
    /// Dog-friendly beach.
    Beach,
    /// Cafe or restaurant that welcomes dogs.
    Cafe,
    /// Walking or hiking trail.
    Trail,
    /// Anything else.
    #[default]
    Other,
}

impl PlaceCategory {
    /// Stored representation of the category.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Park => "park",
            Self::Beach => "beach",
            Self::Cafe => "cafe",
            Self::Trail => "trail",
            Self::Other => "other",
        }
    }
}

impl FromStr for PlaceCategory {
    type Err = PlaceError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "park" => Ok(Self::Park),
            "beach" => Ok(Self::Beach),
            "cafe" => Ok(Self::Cafe),
            "trail" => Ok(Self::Trail),
            "other" => Ok(Self::Other),
            unknown => Err(PlaceError::UnknownCategory {
                category: unknown.to_owned(),
            }),
        }
    }
}

/// Attribution attached to user-authored content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    /// Account identifier of the author.
    pub id: UserId,
    /// Display name shown alongside the content.
    pub name: String,
}

impl Author {
    /// Construct an author from an identifier and display name.
    #[must_use]
    pub fn new(id: UserId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// Sentinel author used once an account has been deleted.
    ///
    /// # Examples
    /// ```
    /// use pawmap_core::Author;
    ///
    /// let author = Author::deleted();
    /// assert!(author.is_deleted());
    /// assert_eq!(author.name, "deleted_user");
    /// ```
    #[must_use]
    pub fn deleted() -> Self {
        Self {
            id: UserId::deleted(),
            name: DELETED_USER.to_owned(),
        }
    }

    /// Report whether the author has been replaced by the sentinel.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.id.as_str() == DELETED_USER && self.name == DELETED_USER
    }
}

/// A dog-friendly place as stored in the place collection.
///
/// `rating` and `review_count` are aggregates maintained by the rating
/// recomputation job; `report_count` counts reports ever filed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    /// Unique identifier.
    pub id: PlaceId,
    /// Human readable name.
    pub name: String,
    /// Venue category.
    #[serde(default)]
    pub category: PlaceCategory,
    /// Average review rating in `0.0..=5.0`.
    pub rating: f64,
    /// Stored number of reviews.
    pub review_count: u32,
    /// Whether staff verified the listing.
    pub is_verified: bool,
    /// Number of reports filed against the place.
    pub report_count: u32,
    /// Whether the place awaits manual moderation.
    #[serde(default)]
    pub needs_review: bool,
    /// When the place was flagged for moderation.
    #[serde(default)]
    pub flagged_at: Option<DateTime<Utc>>,
    /// Account that added the place.
    pub created_by: UserId,
    /// Display name of the account that added the place.
    pub created_by_name: String,
}

/// Errors returned by [`Place::new`].
#[derive(Debug, Error, PartialEq)]
pub enum PlaceError {
    /// The name was empty.
    #[error("place name must not be blank")]
    BlankName,
    /// The rating fell outside `0.0..=5.0` or was not finite.
    #[error("place rating {rating} must be between 0.0 and 5.0")]
    InvalidRating {
        /// Offending rating.
        rating: f64,
    },
    /// The stored category is not recognised.
    #[error("unknown place category '{category}'")]
    UnknownCategory {
        /// Stored value.
        category: String,
    },
}

impl Place {
    /// Validate and construct an unverified, unreported place with no
    /// reviews.
    ///
    /// # Errors
    /// Returns [`PlaceError::BlankName`] when `name` is blank.
    ///
    /// # Examples
    /// ```
    /// use pawmap_core::{Author, Place, PlaceCategory, PlaceId, UserId};
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let author = Author::new(UserId::new("u1")?, "Sam");
    /// let place = Place::new(PlaceId::new("p1")?, "Bark Park", PlaceCategory::Park, author)?;
    /// assert_eq!(place.review_count, 0);
    /// assert!(!place.is_verified);
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(
        id: PlaceId,
        name: impl Into<String>,
        category: PlaceCategory,
        created_by: Author,
    ) -> Result<Self, PlaceError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(PlaceError::BlankName);
        }
        Ok(Self {
            id,
            name,
            category,
            rating: 0.0,
            review_count: 0,
            is_verified: false,
            report_count: 0,
            needs_review: false,
            flagged_at: None,
            created_by: created_by.id,
            created_by_name: created_by.name,
        })
    }

    /// Check invariants on fields that arrive from the store.
    ///
    /// # Errors
    /// Returns [`PlaceError`] when the name is blank or the rating is out of
    /// range.
    pub fn validate(&self) -> Result<(), PlaceError> {
        if self.name.trim().is_empty() {
            return Err(PlaceError::BlankName);
        }
        if !self.rating.is_finite() || !(0.0..=MAX_RATING).contains(&self.rating) {
            return Err(PlaceError::InvalidRating {
                rating: self.rating,
            });
        }
        Ok(())
    }

    /// Attribution of the account that added the place.
    #[must_use]
    pub fn author(&self) -> Author {
        Author::new(self.created_by.clone(), self.created_by_name.clone())
    }

    /// Mark the place as verified.
    #[must_use]
    pub fn verified(mut self) -> Self {
        self.is_verified = true;
        self
    }

    /// Replace the report count.
    #[must_use]
    pub fn with_report_count(mut self, report_count: u32) -> Self {
        self.report_count = report_count;
        self
    }
}
