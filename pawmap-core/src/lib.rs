//! Core domain types for the PawMap engine.
//!
//! Records mirror the documents of the backing store (places, reviews,
//! reports, and the ranked top-picks list) as explicit, typed structs.
//! Constructors and validators return `Result` so malformed documents are
//! caught at the store boundary instead of inside the scoring jobs.
//!
//! The [`store`] module defines one collaborator trait per collection, a
//! moderator notification trait, and (behind the default `store-sqlite`
//! feature) a `SQLite` implementation of every store.

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod ids;
mod place;
mod report;
mod review;
pub mod scorer;
pub mod store;
mod top_picks;

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-support")))]
pub mod test_support;

pub use ids::{DELETED_USER, IdError, PlaceId, ReportId, ReviewId, UserId};
pub use place::{Author, MAX_RATING, Place, PlaceCategory, PlaceError};
pub use report::Report;
pub use review::{Rating, RatingError, Review};
pub use scorer::PlaceScorer;
pub use store::{
    AccountPurge, AccountStore, Fetched, LogNotifier, MalformedRecord, ModerationAlert,
    ModeratorNotifier, NotifyError, PlaceStore, ReportStore, ReviewStore, StoreError,
    TopPicksStore,
};
#[cfg(feature = "store-sqlite")]
pub use store::{SchemaError, SqliteStore};
pub use top_picks::{NATIONAL_TOP_PICKS, RankedPlace, TOP_PICKS_LIMIT, TopPicksList};
