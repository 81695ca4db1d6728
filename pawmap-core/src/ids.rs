//! Identifier newtypes for documents held by the backing store.
//!
//! Each identifier wraps a non-empty string. Whitespace-only values are
//! rejected so blank document keys never reach the jobs.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier and display name written in place of a deleted author.
pub const DELETED_USER: &str = "deleted_user";

/// Errors returned when constructing an identifier.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdError {
    /// The identifier was empty or contained only whitespace.
    #[error("{kind} identifier must not be blank")]
    Blank {
        /// Kind of identifier being constructed.
        kind: &'static str,
    },
}

macro_rules! document_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Validate and wrap an identifier.
            ///
            /// # Errors
            /// Returns [`IdError::Blank`] when `value` is empty or whitespace.
            pub fn new(value: impl Into<String>) -> Result<Self, IdError> {
                let value = value.into();
                if value.trim().is_empty() {
                    return Err(IdError::Blank { kind: $kind });
                }
                Ok(Self(value))
            }

            /// Borrow the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

document_id!(
    /// Identifier of a place document.
    ///
    /// # Examples
    /// ```
    /// use pawmap_core::PlaceId;
    ///
    /// let id = PlaceId::new("dog-beach-7").expect("valid id");
    /// assert_eq!(id.as_str(), "dog-beach-7");
    /// assert!(PlaceId::new("  ").is_err());
    /// ```
    PlaceId,
    "place"
);
document_id!(
    /// Identifier of a review document.
    ReviewId,
    "review"
);
document_id!(
    /// Identifier of a report document.
    ReportId,
    "report"
);
document_id!(
    /// Identifier of a user account.
    UserId,
    "user"
);

impl UserId {
    /// Sentinel identifier that replaces a deleted account's id.
    #[must_use]
    pub fn deleted() -> Self {
        Self(DELETED_USER.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("\t\n")]
    fn rejects_blank_identifiers(#[case] raw: &str) {
        assert_eq!(
            UserId::new(raw),
            Err(IdError::Blank { kind: "user" }),
            "blank value {raw:?} should be rejected"
        );
    }

    #[rstest]
    fn deserialising_blank_id_fails() {
        let result: Result<PlaceId, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }

    #[rstest]
    fn serialises_as_plain_string() {
        let id = ReviewId::new("r-1").unwrap_or_else(|err| panic!("valid id: {err}"));
        let json = serde_json::to_string(&id).unwrap_or_else(|err| panic!("serialise id: {err}"));
        assert_eq!(json, "\"r-1\"");
    }
}
