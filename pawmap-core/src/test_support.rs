//! Test-only, in-memory store and notifier implementations used by unit and
//! behaviour tests.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};

use crate::store::{
    AccountPurge, AccountStore, Fetched, MalformedRecord, ModerationAlert, ModeratorNotifier,
    NotifyError, PlaceStore, ReportStore, ReviewStore, StoreError, TopPicksStore,
};
use crate::{Author, Place, PlaceId, Report, ReportId, Review, ReviewId, TopPicksList, UserId};

/// In-memory implementation of every store trait.
///
/// Collections are kept in insertion order and scanned linearly; the store is
/// intended only for small datasets. Malformed documents can be injected to
/// exercise skip-and-log paths.
#[derive(Debug, Default)]
pub struct MemoryStore {
    places: RefCell<Vec<Place>>,
    reviews: RefCell<Vec<Review>>,
    reports: RefCell<Vec<Report>>,
    malformed: RefCell<Vec<MalformedRecord>>,
    top_picks: RefCell<BTreeMap<String, TopPicksList>>,
    profiles: RefCell<BTreeSet<UserId>>,
    stats: RefCell<BTreeSet<UserId>>,
    preferences: RefCell<BTreeSet<UserId>>,
    favorites: RefCell<Vec<(UserId, PlaceId)>>,
    moderators: RefCell<Vec<UserId>>,
    unavailable: RefCell<bool>,
}

impl MemoryStore {
    /// Create a store holding the given places.
    pub fn with_places<I>(places: I) -> Self
    where
        I: IntoIterator<Item = Place>,
    {
        let store = Self::default();
        store.places.borrow_mut().extend(places);
        store
    }

    /// Add a place.
    pub fn add_place(&self, place: Place) {
        self.places.borrow_mut().push(place);
    }

    /// Add a review.
    pub fn add_review(&self, review: Review) {
        self.reviews.borrow_mut().push(review);
    }

    /// Add a report without touching the place's report count.
    pub fn add_report(&self, report: Report) {
        self.reports.borrow_mut().push(report);
    }

    /// Inject a malformed document.
    ///
    /// It is returned by every fetch of its collection except the
    /// per-author lookups.
    pub fn add_malformed(&self, record: MalformedRecord) {
        self.malformed.borrow_mut().push(record);
    }

    /// Register personal documents for `user`.
    pub fn add_account(&self, user: &UserId, favorites: &[PlaceId]) {
        self.profiles.borrow_mut().insert(user.clone());
        self.stats.borrow_mut().insert(user.clone());
        self.preferences.borrow_mut().insert(user.clone());
        self.favorites
            .borrow_mut()
            .extend(favorites.iter().map(|place| (user.clone(), place.clone())));
    }

    /// Register `user` as a moderator.
    pub fn add_moderator(&self, user: UserId) {
        self.moderators.borrow_mut().push(user);
    }

    /// Make every subsequent call fail with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.borrow_mut() = unavailable;
    }

    /// Snapshot of the stored places.
    #[must_use]
    pub fn places(&self) -> Vec<Place> {
        self.places.borrow().clone()
    }

    /// Snapshot of the stored reviews.
    #[must_use]
    pub fn reviews(&self) -> Vec<Review> {
        self.reviews.borrow().clone()
    }

    /// Snapshot of the stored reports.
    #[must_use]
    pub fn reports(&self) -> Vec<Report> {
        self.reports.borrow().clone()
    }

    /// Look up a stored place.
    #[must_use]
    pub fn place(&self, id: &PlaceId) -> Option<Place> {
        self.places.borrow().iter().find(|p| &p.id == id).cloned()
    }

    /// Report whether any personal document remains for `user`.
    #[must_use]
    pub fn has_account_data(&self, user: &UserId) -> bool {
        self.profiles.borrow().contains(user)
            || self.stats.borrow().contains(user)
            || self.preferences.borrow().contains(user)
            || self.favorites.borrow().iter().any(|(owner, _)| owner == user)
    }

    fn check_available(&self, operation: &'static str) -> Result<(), StoreError> {
        if *self.unavailable.borrow() {
            return Err(StoreError::Unavailable {
                operation,
                reason: "memory store switched off".to_owned(),
            });
        }
        Ok(())
    }

    fn collect<T: Clone>(
        &self,
        operation: &'static str,
        collection: &'static str,
        records: &RefCell<Vec<T>>,
        keep: impl Fn(&T) -> bool,
    ) -> Fetched<T> {
        self.check_available(operation)?;
        let mut fetched: Vec<Result<T, MalformedRecord>> = records
            .borrow()
            .iter()
            .filter(|record| keep(record))
            .cloned()
            .map(Ok)
            .collect();
        fetched.extend(
            self.malformed
                .borrow()
                .iter()
                .filter(|record| record.collection == collection)
                .cloned()
                .map(Err),
        );
        Ok(fetched)
    }

    fn update_place(
        &self,
        operation: &'static str,
        id: &PlaceId,
        update: impl FnOnce(&mut Place),
    ) -> Result<(), StoreError> {
        self.check_available(operation)?;
        let mut places = self.places.borrow_mut();
        let place = places
            .iter_mut()
            .find(|place| &place.id == id)
            .ok_or_else(|| StoreError::NotFound {
                collection: "places",
                id: id.to_string(),
            })?;
        update(place);
        Ok(())
    }
}

impl PlaceStore for MemoryStore {
    fn fetch_places(&self) -> Fetched<Place> {
        self.collect("fetch places", "places", &self.places, |_| true)
    }

    fn places_created_by(&self, author: &UserId) -> Fetched<Place> {
        self.check_available("fetch places by author")?;
        Ok(self
            .places
            .borrow()
            .iter()
            .filter(|place| &place.created_by == author)
            .cloned()
            .map(Ok)
            .collect())
    }

    fn update_rating(
        &self,
        place: &PlaceId,
        rating: f64,
        review_count: u32,
    ) -> Result<(), StoreError> {
        self.update_place("update place rating", place, |stored| {
            stored.rating = rating;
            stored.review_count = review_count;
        })
    }

    fn flag_for_review(&self, place: &PlaceId, flagged_at: DateTime<Utc>) -> Result<(), StoreError> {
        self.update_place("flag place for review", place, |stored| {
            stored.needs_review = true;
            stored.flagged_at = Some(flagged_at);
        })
    }

    fn reattribute_place(&self, place: &PlaceId, author: &Author) -> Result<(), StoreError> {
        self.update_place("reattribute place", place, |stored| {
            stored.created_by = author.id.clone();
            stored.created_by_name = author.name.clone();
        })
    }
}

impl ReviewStore for MemoryStore {
    fn fetch_reviews(&self) -> Fetched<Review> {
        self.collect("fetch reviews", "reviews", &self.reviews, |_| true)
    }

    fn reviews_for_place(&self, place: &PlaceId) -> Fetched<Review> {
        self.collect("fetch reviews for place", "reviews", &self.reviews, |review| {
            &review.place_id == place
        })
    }

    fn reviews_by_author(&self, author: &UserId) -> Fetched<Review> {
        self.check_available("fetch reviews by author")?;
        Ok(self
            .reviews
            .borrow()
            .iter()
            .filter(|review| &review.author_id == author)
            .cloned()
            .map(Ok)
            .collect())
    }

    fn reattribute_review(&self, review: &ReviewId, author: &Author) -> Result<(), StoreError> {
        self.check_available("reattribute review")?;
        let mut reviews = self.reviews.borrow_mut();
        let stored = reviews
            .iter_mut()
            .find(|stored| &stored.id == review)
            .ok_or_else(|| StoreError::NotFound {
                collection: "reviews",
                id: review.to_string(),
            })?;
        stored.author_id = author.id.clone();
        stored.author_name = author.name.clone();
        Ok(())
    }
}

impl ReportStore for MemoryStore {
    fn create_report(&self, report: &Report) -> Result<(), StoreError> {
        self.update_place("create report", &report.place_id, |place| {
            place.report_count = place.report_count.saturating_add(1);
        })?;
        self.reports.borrow_mut().push(report.clone());
        Ok(())
    }

    fn unresolved_reports_for_place(&self, place: &PlaceId) -> Fetched<Report> {
        self.collect("fetch unresolved reports", "reports", &self.reports, |report| {
            &report.place_id == place && !report.is_resolved
        })
    }

    fn resolved_reports_before(&self, cutoff: DateTime<Utc>) -> Fetched<Report> {
        self.collect("fetch resolved reports", "reports", &self.reports, |report| {
            report.is_resolved && report.created_at < cutoff
        })
    }

    fn delete_reports(&self, reports: &[ReportId]) -> Result<usize, StoreError> {
        self.check_available("delete reports")?;
        let mut stored = self.reports.borrow_mut();
        let before = stored.len();
        stored.retain(|report| !reports.contains(&report.id));
        Ok(before - stored.len())
    }
}

impl TopPicksStore for MemoryStore {
    fn replace_top_picks(&self, key: &str, list: &TopPicksList) -> Result<(), StoreError> {
        self.check_available("replace top picks")?;
        self.top_picks
            .borrow_mut()
            .insert(key.to_owned(), list.clone());
        Ok(())
    }

    fn top_picks(&self, key: &str) -> Result<Option<TopPicksList>, StoreError> {
        self.check_available("read top picks")?;
        Ok(self.top_picks.borrow().get(key).cloned())
    }
}

impl AccountStore for MemoryStore {
    fn purge_account(&self, user: &UserId) -> Result<AccountPurge, StoreError> {
        self.check_available("purge account")?;
        let mut favorites = self.favorites.borrow_mut();
        let before = favorites.len();
        favorites.retain(|(owner, _)| owner != user);
        Ok(AccountPurge {
            profiles: usize::from(self.profiles.borrow_mut().remove(user)),
            stats: usize::from(self.stats.borrow_mut().remove(user)),
            preferences: usize::from(self.preferences.borrow_mut().remove(user)),
            favorites: before - favorites.len(),
        })
    }

    fn moderators(&self) -> Result<Vec<UserId>, StoreError> {
        self.check_available("fetch moderators")?;
        Ok(self.moderators.borrow().clone())
    }
}

/// Notifier that records every alert and can be told to reject moderators.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: RefCell<Vec<(UserId, ModerationAlert)>>,
    unreachable: RefCell<BTreeSet<UserId>>,
}

impl RecordingNotifier {
    /// Make deliveries to `moderator` fail.
    pub fn reject(&self, moderator: UserId) {
        self.unreachable.borrow_mut().insert(moderator);
    }

    /// Alerts delivered so far.
    #[must_use]
    pub fn sent(&self) -> Vec<(UserId, ModerationAlert)> {
        self.sent.borrow().clone()
    }
}

impl ModeratorNotifier for RecordingNotifier {
    fn notify(&self, moderator: &UserId, alert: &ModerationAlert) -> Result<(), NotifyError> {
        if self.unreachable.borrow().contains(moderator) {
            return Err(NotifyError {
                moderator: moderator.clone(),
                reason: "mailbox unreachable".to_owned(),
            });
        }
        self.sent
            .borrow_mut()
            .push((moderator.clone(), alert.clone()));
        Ok(())
    }
}
