//! SQLite-backed implementation of every PawMap collection.
//!
//! One database file stands in for the managed document store. Rows are
//! read as untyped values and decoded per document so a malformed row is
//! reported as a [`MalformedRecord`] instead of failing the whole query.

use std::{fmt, path::Path, vec};

use chrono::{DateTime, Utc};
use log::warn;
use rusqlite::{Connection, OptionalExtension, Params, Row, types::Value};

use crate::{
    Author, Place, PlaceCategory, PlaceId, Rating, Report, ReportId, Review, ReviewId,
    TopPicksList, UserId,
};

use super::schema::{SchemaError, initialise_schema};
use super::{
    AccountPurge, AccountStore, Fetched, MalformedRecord, PlaceStore, ReportStore, ReviewStore,
    StoreError, TopPicksStore,
};

const PLACES: &str = "places";
const REVIEWS: &str = "reviews";
const REPORTS: &str = "reports";

const PLACE_COLUMNS: &str = "id, name, category, rating, review_count, is_verified, \
     report_count, needs_review, flagged_at, created_by, created_by_name";
const REVIEW_COLUMNS: &str = "id, place_id, rating, created_at, author_id, author_name, comment";
const REPORT_COLUMNS: &str = "id, place_id, reporter_id, reason, is_resolved, created_at";

/// Read-write store over a single `SQLite` database.
///
/// Collections are returned in insertion order so callers that rely on a
/// stable input order (the top-picks tie break) see the same order on every
/// run.
pub struct SqliteStore {
    connection: Connection,
}

impl fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteStore")
            .field("path", &self.connection.path())
            .finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Open (creating when missing) the database at `path` and ensure the
    /// schema is present.
    ///
    /// # Errors
    /// Returns [`SchemaError`] when the file cannot be opened or the schema
    /// cannot be initialised.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        let connection = Connection::open(path).map_err(|source| SchemaError::Open {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_connection(connection)
    }

    /// Open a private in-memory database with the schema applied.
    ///
    /// # Errors
    /// Returns [`SchemaError`] when the schema cannot be initialised.
    pub fn open_in_memory() -> Result<Self, SchemaError> {
        let connection = Connection::open_in_memory().map_err(|source| SchemaError::Open {
            path: ":memory:".to_owned(),
            source,
        })?;
        Self::from_connection(connection)
    }

    fn from_connection(mut connection: Connection) -> Result<Self, SchemaError> {
        initialise_schema(&mut connection)?;
        Ok(Self { connection })
    }

    /// Borrow the underlying connection.
    #[must_use]
    pub const fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Insert a new place document.
    ///
    /// # Errors
    /// Returns [`StoreError::Sqlite`] when the insert fails, including when
    /// the identifier is already taken.
    pub fn insert_place(&self, place: &Place) -> Result<(), StoreError> {
        self.connection
            .execute(
                "INSERT INTO places (id, name, category, rating, review_count, is_verified,
                    report_count, needs_review, flagged_at, created_by, created_by_name)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                (
                    place.id.as_str(),
                    place.name.as_str(),
                    place.category.as_str(),
                    place.rating,
                    place.review_count,
                    place.is_verified,
                    place.report_count,
                    place.needs_review,
                    place.flagged_at.map(|at| at.timestamp_millis()),
                    place.created_by.as_str(),
                    place.created_by_name.as_str(),
                ),
            )
            .map(|_| ())
            .map_err(sqlite_error("insert place"))
    }

    /// Insert a new review document.
    ///
    /// The place's stored rating is not touched; run the rating job after
    /// inserting reviews.
    ///
    /// # Errors
    /// Returns [`StoreError::Sqlite`] when the insert fails.
    pub fn insert_review(&self, review: &Review) -> Result<(), StoreError> {
        self.connection
            .execute(
                "INSERT INTO reviews (id, place_id, rating, created_at, author_id, author_name, comment)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                (
                    review.id.as_str(),
                    review.place_id.as_str(),
                    review.rating.get(),
                    review.created_at.timestamp_millis(),
                    review.author_id.as_str(),
                    review.author_name.as_str(),
                    review.comment.as_deref(),
                ),
            )
            .map(|_| ())
            .map_err(sqlite_error("insert review"))
    }

    /// Store or replace a user's profile.
    ///
    /// # Errors
    /// Returns [`StoreError::Sqlite`] when the write fails.
    pub fn save_profile(&self, user: &UserId, display_name: &str) -> Result<(), StoreError> {
        self.connection
            .execute(
                "INSERT INTO profiles (user_id, display_name) VALUES (?1, ?2)
                 ON CONFLICT(user_id) DO UPDATE SET display_name = excluded.display_name",
                (user.as_str(), display_name),
            )
            .map(|_| ())
            .map_err(sqlite_error("save profile"))
    }

    /// Store or replace a user's statistics document.
    ///
    /// # Errors
    /// Returns [`StoreError`] when encoding or the write fails.
    pub fn save_user_stats(
        &self,
        user: &UserId,
        stats: &serde_json::Value,
    ) -> Result<(), StoreError> {
        self.save_user_document(
            "INSERT INTO user_stats (user_id, payload) VALUES (?1, ?2)
             ON CONFLICT(user_id) DO UPDATE SET payload = excluded.payload",
            "save user stats",
            user,
            stats,
        )
    }

    /// Store or replace a user's preferences document.
    ///
    /// # Errors
    /// Returns [`StoreError`] when encoding or the write fails.
    pub fn save_user_preferences(
        &self,
        user: &UserId,
        preferences: &serde_json::Value,
    ) -> Result<(), StoreError> {
        self.save_user_document(
            "INSERT INTO user_preferences (user_id, payload) VALUES (?1, ?2)
             ON CONFLICT(user_id) DO UPDATE SET payload = excluded.payload",
            "save user preferences",
            user,
            preferences,
        )
    }

    fn save_user_document(
        &self,
        sql: &str,
        operation: &'static str,
        user: &UserId,
        document: &serde_json::Value,
    ) -> Result<(), StoreError> {
        let payload = serde_json::to_string(document)
            .map_err(|source| StoreError::Serialization { operation, source })?;
        self.connection
            .execute(sql, (user.as_str(), payload))
            .map(|_| ())
            .map_err(sqlite_error(operation))
    }

    /// Record `place` as one of `user`'s favourites.
    ///
    /// # Errors
    /// Returns [`StoreError::Sqlite`] when the write fails.
    pub fn add_favorite(&self, user: &UserId, place: &PlaceId) -> Result<(), StoreError> {
        self.connection
            .execute(
                "INSERT OR IGNORE INTO favorites (user_id, place_id) VALUES (?1, ?2)",
                (user.as_str(), place.as_str()),
            )
            .map(|_| ())
            .map_err(sqlite_error("add favorite"))
    }

    /// Register `user` as a moderator.
    ///
    /// # Errors
    /// Returns [`StoreError::Sqlite`] when the write fails.
    pub fn add_moderator(&self, user: &UserId) -> Result<(), StoreError> {
        self.connection
            .execute(
                "INSERT OR IGNORE INTO moderators (user_id) VALUES (?1)",
                [user.as_str()],
            )
            .map(|_| ())
            .map_err(sqlite_error("add moderator"))
    }

    fn fetch<T, P: Params>(
        &self,
        operation: &'static str,
        sql: &str,
        params: P,
        decode: fn(Vec<Value>) -> Result<T, MalformedRecord>,
    ) -> Fetched<T> {
        let mut statement = self
            .connection
            .prepare_cached(sql)
            .map_err(sqlite_error(operation))?;
        let rows = statement
            .query_map(params, read_values)
            .map_err(sqlite_error(operation))?;
        let mut records = Vec::new();
        for row in rows {
            let values = row.map_err(sqlite_error(operation))?;
            records.push(decode(values));
        }
        Ok(records)
    }

    fn update_one(
        &self,
        operation: &'static str,
        collection: &'static str,
        id: &str,
        sql: &str,
        params: impl Params,
    ) -> Result<(), StoreError> {
        let changed = self
            .connection
            .execute(sql, params)
            .map_err(sqlite_error(operation))?;
        if changed == 0 {
            return Err(StoreError::NotFound {
                collection,
                id: id.to_owned(),
            });
        }
        Ok(())
    }
}

impl PlaceStore for SqliteStore {
    fn fetch_places(&self) -> Fetched<Place> {
        self.fetch(
            "fetch places",
            &format!("SELECT {PLACE_COLUMNS} FROM places ORDER BY rowid"),
            [],
            decode_place,
        )
    }

    fn places_created_by(&self, author: &UserId) -> Fetched<Place> {
        self.fetch(
            "fetch places by author",
            &format!("SELECT {PLACE_COLUMNS} FROM places WHERE created_by = ?1 ORDER BY rowid"),
            [author.as_str()],
            decode_place,
        )
    }

    fn update_rating(
        &self,
        place: &PlaceId,
        rating: f64,
        review_count: u32,
    ) -> Result<(), StoreError> {
        self.update_one(
            "update place rating",
            PLACES,
            place.as_str(),
            "UPDATE places SET rating = ?1, review_count = ?2 WHERE id = ?3",
            (rating, review_count, place.as_str()),
        )
    }

    fn flag_for_review(&self, place: &PlaceId, flagged_at: DateTime<Utc>) -> Result<(), StoreError> {
        self.update_one(
            "flag place for review",
            PLACES,
            place.as_str(),
            "UPDATE places SET needs_review = 1, flagged_at = ?1 WHERE id = ?2",
            (flagged_at.timestamp_millis(), place.as_str()),
        )
    }

    fn reattribute_place(&self, place: &PlaceId, author: &Author) -> Result<(), StoreError> {
        self.update_one(
            "reattribute place",
            PLACES,
            place.as_str(),
            "UPDATE places SET created_by = ?1, created_by_name = ?2 WHERE id = ?3",
            (author.id.as_str(), author.name.as_str(), place.as_str()),
        )
    }
}

impl ReviewStore for SqliteStore {
    fn fetch_reviews(&self) -> Fetched<Review> {
        self.fetch(
            "fetch reviews",
            &format!("SELECT {REVIEW_COLUMNS} FROM reviews ORDER BY rowid"),
            [],
            decode_review,
        )
    }

    fn reviews_for_place(&self, place: &PlaceId) -> Fetched<Review> {
        self.fetch(
            "fetch reviews for place",
            &format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE place_id = ?1 ORDER BY rowid"),
            [place.as_str()],
            decode_review,
        )
    }

    fn reviews_by_author(&self, author: &UserId) -> Fetched<Review> {
        self.fetch(
            "fetch reviews by author",
            &format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE author_id = ?1 ORDER BY rowid"),
            [author.as_str()],
            decode_review,
        )
    }

    fn reattribute_review(&self, review: &ReviewId, author: &Author) -> Result<(), StoreError> {
        self.update_one(
            "reattribute review",
            REVIEWS,
            review.as_str(),
            "UPDATE reviews SET author_id = ?1, author_name = ?2 WHERE id = ?3",
            (author.id.as_str(), author.name.as_str(), review.as_str()),
        )
    }
}

impl ReportStore for SqliteStore {
    fn create_report(&self, report: &Report) -> Result<(), StoreError> {
        let transaction = self
            .connection
            .unchecked_transaction()
            .map_err(sqlite_error("begin report transaction"))?;
        let bumped = transaction
            .execute(
                "UPDATE places SET report_count = report_count + 1 WHERE id = ?1",
                [report.place_id.as_str()],
            )
            .map_err(sqlite_error("bump report count"))?;
        if bumped == 0 {
            return Err(StoreError::NotFound {
                collection: PLACES,
                id: report.place_id.to_string(),
            });
        }
        transaction
            .execute(
                "INSERT INTO reports (id, place_id, reporter_id, reason, is_resolved, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                (
                    report.id.as_str(),
                    report.place_id.as_str(),
                    report.reporter_id.as_str(),
                    report.reason.as_str(),
                    report.is_resolved,
                    report.created_at.timestamp_millis(),
                ),
            )
            .map_err(sqlite_error("insert report"))?;
        transaction
            .commit()
            .map_err(sqlite_error("commit report transaction"))
    }

    fn unresolved_reports_for_place(&self, place: &PlaceId) -> Fetched<Report> {
        self.fetch(
            "fetch unresolved reports",
            &format!(
                "SELECT {REPORT_COLUMNS} FROM reports
                 WHERE place_id = ?1 AND is_resolved = 0 ORDER BY rowid"
            ),
            [place.as_str()],
            decode_report,
        )
    }

    fn resolved_reports_before(&self, cutoff: DateTime<Utc>) -> Fetched<Report> {
        self.fetch(
            "fetch resolved reports",
            &format!(
                "SELECT {REPORT_COLUMNS} FROM reports
                 WHERE is_resolved = 1 AND created_at < ?1 ORDER BY rowid"
            ),
            [cutoff.timestamp_millis()],
            decode_report,
        )
    }

    fn delete_reports(&self, reports: &[ReportId]) -> Result<usize, StoreError> {
        if reports.is_empty() {
            return Ok(0);
        }
        let transaction = self
            .connection
            .unchecked_transaction()
            .map_err(sqlite_error("begin report deletion"))?;
        let mut deleted = 0;
        {
            let mut statement = transaction
                .prepare_cached("DELETE FROM reports WHERE id = ?1")
                .map_err(sqlite_error("prepare report deletion"))?;
            for report in reports {
                deleted += statement
                    .execute([report.as_str()])
                    .map_err(sqlite_error("delete report"))?;
            }
        }
        transaction
            .commit()
            .map_err(sqlite_error("commit report deletion"))?;
        Ok(deleted)
    }
}

impl TopPicksStore for SqliteStore {
    fn replace_top_picks(&self, key: &str, list: &TopPicksList) -> Result<(), StoreError> {
        let payload =
            serde_json::to_string(list).map_err(|source| StoreError::Serialization {
                operation: "encode top picks",
                source,
            })?;
        self.connection
            .execute(
                "INSERT INTO top_picks (key, payload, last_updated) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET
                    payload = excluded.payload,
                    last_updated = excluded.last_updated",
                (key, payload, list.last_updated.timestamp_millis()),
            )
            .map(|_| ())
            .map_err(sqlite_error("replace top picks"))
    }

    fn top_picks(&self, key: &str) -> Result<Option<TopPicksList>, StoreError> {
        let payload: Option<String> = self
            .connection
            .query_row("SELECT payload FROM top_picks WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()
            .map_err(sqlite_error("read top picks"))?;
        payload
            .map(|json| {
                serde_json::from_str(&json).map_err(|source| StoreError::Serialization {
                    operation: "decode top picks",
                    source,
                })
            })
            .transpose()
    }
}

impl AccountStore for SqliteStore {
    fn purge_account(&self, user: &UserId) -> Result<AccountPurge, StoreError> {
        let transaction = self
            .connection
            .unchecked_transaction()
            .map_err(sqlite_error("begin account purge"))?;
        let delete = |operation: &'static str, sql: &str| {
            transaction
                .execute(sql, [user.as_str()])
                .map_err(sqlite_error(operation))
        };
        let purge = AccountPurge {
            profiles: delete("delete profile", "DELETE FROM profiles WHERE user_id = ?1")?,
            stats: delete("delete user stats", "DELETE FROM user_stats WHERE user_id = ?1")?,
            preferences: delete(
                "delete user preferences",
                "DELETE FROM user_preferences WHERE user_id = ?1",
            )?,
            favorites: delete("delete favorites", "DELETE FROM favorites WHERE user_id = ?1")?,
        };
        transaction
            .commit()
            .map_err(sqlite_error("commit account purge"))?;
        Ok(purge)
    }

    fn moderators(&self) -> Result<Vec<UserId>, StoreError> {
        let mut statement = self
            .connection
            .prepare_cached("SELECT user_id FROM moderators ORDER BY user_id")
            .map_err(sqlite_error("fetch moderators"))?;
        let rows = statement
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(sqlite_error("fetch moderators"))?;
        let mut moderators = Vec::new();
        for row in rows {
            let raw = row.map_err(sqlite_error("read moderator"))?;
            match UserId::new(raw) {
                Ok(id) => moderators.push(id),
                Err(err) => warn!("skipping moderator entry: {err}"),
            }
        }
        Ok(moderators)
    }
}

fn sqlite_error(operation: &'static str) -> impl Fn(rusqlite::Error) -> StoreError {
    move |source| StoreError::Sqlite { operation, source }
}

fn read_values(row: &Row<'_>) -> rusqlite::Result<Vec<Value>> {
    let count = row.as_ref().column_count();
    (0..count).map(|index| row.get::<_, Value>(index)).collect()
}

/// Sequential, typed access to the columns of one raw row.
struct Columns {
    collection: &'static str,
    id: String,
    values: vec::IntoIter<Value>,
}

impl Columns {
    fn new(collection: &'static str, values: Vec<Value>) -> Self {
        let id = match values.first() {
            Some(Value::Text(text)) => text.clone(),
            Some(other) => format!("{other:?}"),
            None => String::new(),
        };
        Self {
            collection,
            id,
            values: values.into_iter(),
        }
    }

    fn malformed(&self, reason: impl ToString) -> MalformedRecord {
        MalformedRecord::new(self.collection, self.id.clone(), reason)
    }

    fn next(&mut self, column: &'static str) -> Result<Value, MalformedRecord> {
        self.values
            .next()
            .ok_or_else(|| self.malformed(format!("missing column {column}")))
    }

    fn text(&mut self, column: &'static str) -> Result<String, MalformedRecord> {
        match self.next(column)? {
            Value::Text(text) => Ok(text),
            other => Err(self.malformed(format!(
                "{column} must be text, found {}",
                other.data_type()
            ))),
        }
    }

    fn optional_text(&mut self, column: &'static str) -> Result<Option<String>, MalformedRecord> {
        match self.next(column)? {
            Value::Null => Ok(None),
            Value::Text(text) => Ok(Some(text)),
            other => Err(self.malformed(format!(
                "{column} must be text, found {}",
                other.data_type()
            ))),
        }
    }

    fn parsed<T, E: fmt::Display>(
        &mut self,
        column: &'static str,
        parse: impl FnOnce(String) -> Result<T, E>,
    ) -> Result<T, MalformedRecord> {
        let raw = self.text(column)?;
        parse(raw).map_err(|err| self.malformed(format!("{column}: {err}")))
    }

    fn integer(&mut self, column: &'static str) -> Result<i64, MalformedRecord> {
        match self.next(column)? {
            Value::Integer(value) => Ok(value),
            other => Err(self.malformed(format!(
                "{column} must be an integer, found {}",
                other.data_type()
            ))),
        }
    }

    #[expect(
        clippy::cast_precision_loss,
        reason = "integral ratings stored by older clients are small"
    )]
    fn real(&mut self, column: &'static str) -> Result<f64, MalformedRecord> {
        match self.next(column)? {
            Value::Real(value) => Ok(value),
            Value::Integer(value) => Ok(value as f64),
            other => Err(self.malformed(format!(
                "{column} must be a number, found {}",
                other.data_type()
            ))),
        }
    }

    fn count(&mut self, column: &'static str) -> Result<u32, MalformedRecord> {
        let value = self.integer(column)?;
        u32::try_from(value).map_err(|_| self.malformed(format!("{column} {value} is out of range")))
    }

    fn flag(&mut self, column: &'static str) -> Result<bool, MalformedRecord> {
        match self.integer(column)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(self.malformed(format!("{column} must be 0 or 1, found {other}"))),
        }
    }

    fn timestamp(&mut self, column: &'static str) -> Result<DateTime<Utc>, MalformedRecord> {
        let millis = self.integer(column)?;
        DateTime::from_timestamp_millis(millis)
            .ok_or_else(|| self.malformed(format!("{column} {millis} is not a valid timestamp")))
    }

    fn optional_timestamp(
        &mut self,
        column: &'static str,
    ) -> Result<Option<DateTime<Utc>>, MalformedRecord> {
        match self.next(column)? {
            Value::Null => Ok(None),
            Value::Integer(millis) => DateTime::from_timestamp_millis(millis)
                .map(Some)
                .ok_or_else(|| {
                    self.malformed(format!("{column} {millis} is not a valid timestamp"))
                }),
            other => Err(self.malformed(format!(
                "{column} must be an integer, found {}",
                other.data_type()
            ))),
        }
    }
}

fn decode_place(values: Vec<Value>) -> Result<Place, MalformedRecord> {
    let mut columns = Columns::new(PLACES, values);
    let place = Place {
        id: columns.parsed("id", |raw| PlaceId::new(raw))?,
        name: columns.text("name")?,
        category: columns.parsed("category", |raw| raw.parse::<PlaceCategory>())?,
        rating: columns.real("rating")?,
        review_count: columns.count("review_count")?,
        is_verified: columns.flag("is_verified")?,
        report_count: columns.count("report_count")?,
        needs_review: columns.flag("needs_review")?,
        flagged_at: columns.optional_timestamp("flagged_at")?,
        created_by: columns.parsed("created_by", |raw| UserId::new(raw))?,
        created_by_name: columns.text("created_by_name")?,
    };
    place.validate().map_err(|err| columns.malformed(err))?;
    Ok(place)
}

fn decode_review(values: Vec<Value>) -> Result<Review, MalformedRecord> {
    let mut columns = Columns::new(REVIEWS, values);
    let id = columns.parsed("id", |raw| ReviewId::new(raw))?;
    let place_id = columns.parsed("place_id", |raw| PlaceId::new(raw))?;
    let raw_rating = columns.integer("rating")?;
    let rating = Rating::try_from(raw_rating).map_err(|err| columns.malformed(err))?;
    Ok(Review {
        id,
        place_id,
        rating,
        created_at: columns.timestamp("created_at")?,
        author_id: columns.parsed("author_id", |raw| UserId::new(raw))?,
        author_name: columns.text("author_name")?,
        comment: columns.optional_text("comment")?,
    })
}

fn decode_report(values: Vec<Value>) -> Result<Report, MalformedRecord> {
    let mut columns = Columns::new(REPORTS, values);
    Ok(Report {
        id: columns.parsed("id", |raw| ReportId::new(raw))?,
        place_id: columns.parsed("place_id", |raw| PlaceId::new(raw))?,
        reporter_id: columns.parsed("reporter_id", |raw| UserId::new(raw))?,
        reason: columns.text("reason")?,
        is_resolved: columns.flag("is_resolved")?,
        created_at: columns.timestamp("created_at")?,
    })
}
