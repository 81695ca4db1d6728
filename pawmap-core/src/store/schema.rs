//! `SQLite` schema backing [`SqliteStore`](super::SqliteStore).

use rusqlite::{Connection, Error as SqliteError, OptionalExtension, Transaction};
use thiserror::Error;

/// Version recorded in `pawmap_schema_version` by [`initialise_schema`].
pub const SCHEMA_VERSION: i64 = 1;

/// Initialise the PawMap schema inside an existing `SQLite` database.
///
/// Creates the collection tables and indexes, then records the schema
/// version. Existing installations must already match the expected version;
/// mismatches are rejected so migrations can be applied explicitly.
///
/// Timestamps are stored as Unix epoch milliseconds, so any sub-millisecond
/// part is truncated on write. Columns carry no `CHECK` constraints:
/// documents are validated when read so a single bad row never blocks a
/// batch.
///
/// # Errors
/// Returns [`SchemaError`] when a migration step fails or the recorded
/// version differs from [`SCHEMA_VERSION`].
///
/// # Examples
/// ```
/// use rusqlite::Connection;
/// use pawmap_core::store::initialise_schema;
///
/// let mut conn = Connection::open_in_memory().expect("create in-memory database");
/// initialise_schema(&mut conn).expect("create PawMap schema");
///
/// let version: i64 = conn
///     .query_row("SELECT version FROM pawmap_schema_version", [], |row| row.get(0))
///     .expect("read schema version");
/// assert_eq!(version, 1);
/// ```
pub fn initialise_schema(connection: &mut Connection) -> Result<(), SchemaError> {
    let transaction = connection
        .transaction()
        .map_err(|source| SchemaError::Migration {
            step: "begin schema transaction",
            source,
        })?;

    create_collection_tables(&transaction)?;
    create_account_tables(&transaction)?;
    create_indexes(&transaction)?;
    ensure_schema_version(&transaction)?;

    transaction
        .commit()
        .map_err(|source| SchemaError::Migration {
            step: "commit schema transaction",
            source,
        })?;

    Ok(())
}

fn create_collection_tables(transaction: &Transaction<'_>) -> Result<(), SchemaError> {
    run_migration_step(
        transaction,
        "create places",
        "CREATE TABLE IF NOT EXISTS places (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            category TEXT NOT NULL DEFAULT 'other',
            rating REAL NOT NULL DEFAULT 0,
            review_count INTEGER NOT NULL DEFAULT 0,
            is_verified INTEGER NOT NULL DEFAULT 0,
            report_count INTEGER NOT NULL DEFAULT 0,
            needs_review INTEGER NOT NULL DEFAULT 0,
            flagged_at INTEGER,
            created_by TEXT NOT NULL,
            created_by_name TEXT NOT NULL
        )",
    )?;
    run_migration_step(
        transaction,
        "create reviews",
        "CREATE TABLE IF NOT EXISTS reviews (
            id TEXT PRIMARY KEY,
            place_id TEXT NOT NULL,
            rating INTEGER NOT NULL,
            created_at INTEGER NOT NULL,
            author_id TEXT NOT NULL,
            author_name TEXT NOT NULL,
            comment TEXT
        )",
    )?;
    run_migration_step(
        transaction,
        "create reports",
        "CREATE TABLE IF NOT EXISTS reports (
            id TEXT PRIMARY KEY,
            place_id TEXT NOT NULL,
            reporter_id TEXT NOT NULL,
            reason TEXT NOT NULL,
            is_resolved INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL
        )",
    )?;
    run_migration_step(
        transaction,
        "create top_picks",
        "CREATE TABLE IF NOT EXISTS top_picks (
            key TEXT PRIMARY KEY,
            payload TEXT NOT NULL,
            last_updated INTEGER NOT NULL
        ) WITHOUT ROWID",
    )
}

fn create_account_tables(transaction: &Transaction<'_>) -> Result<(), SchemaError> {
    run_migration_step(
        transaction,
        "create profiles",
        "CREATE TABLE IF NOT EXISTS profiles (
            user_id TEXT PRIMARY KEY,
            display_name TEXT NOT NULL
        ) WITHOUT ROWID",
    )?;
    run_migration_step(
        transaction,
        "create user_stats",
        "CREATE TABLE IF NOT EXISTS user_stats (
            user_id TEXT PRIMARY KEY,
            payload TEXT NOT NULL DEFAULT '{}'
        ) WITHOUT ROWID",
    )?;
    run_migration_step(
        transaction,
        "create user_preferences",
        "CREATE TABLE IF NOT EXISTS user_preferences (
            user_id TEXT PRIMARY KEY,
            payload TEXT NOT NULL DEFAULT '{}'
        ) WITHOUT ROWID",
    )?;
    run_migration_step(
        transaction,
        "create favorites",
        "CREATE TABLE IF NOT EXISTS favorites (
            user_id TEXT NOT NULL,
            place_id TEXT NOT NULL,
            PRIMARY KEY (user_id, place_id)
        ) WITHOUT ROWID",
    )?;
    run_migration_step(
        transaction,
        "create moderators",
        "CREATE TABLE IF NOT EXISTS moderators (
            user_id TEXT PRIMARY KEY
        ) WITHOUT ROWID",
    )
}

fn create_indexes(transaction: &Transaction<'_>) -> Result<(), SchemaError> {
    run_migration_step(
        transaction,
        "index reviews by place",
        "CREATE INDEX IF NOT EXISTS idx_reviews_place ON reviews(place_id, created_at)",
    )?;
    run_migration_step(
        transaction,
        "index reviews by author",
        "CREATE INDEX IF NOT EXISTS idx_reviews_author ON reviews(author_id)",
    )?;
    run_migration_step(
        transaction,
        "index places by author",
        "CREATE INDEX IF NOT EXISTS idx_places_author ON places(created_by)",
    )?;
    run_migration_step(
        transaction,
        "index reports by place",
        "CREATE INDEX IF NOT EXISTS idx_reports_place ON reports(place_id, is_resolved)",
    )?;
    run_migration_step(
        transaction,
        "index reports by resolution",
        "CREATE INDEX IF NOT EXISTS idx_reports_resolved ON reports(is_resolved, created_at)",
    )
}

fn ensure_schema_version(transaction: &Transaction<'_>) -> Result<(), SchemaError> {
    run_migration_step(
        transaction,
        "create schema version table",
        "CREATE TABLE IF NOT EXISTS pawmap_schema_version (
            version INTEGER PRIMARY KEY CHECK (version > 0),
            applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
        ) WITHOUT ROWID",
    )?;

    let existing_version: Option<i64> = transaction
        .query_row(
            "SELECT version FROM pawmap_schema_version LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()
        .map_err(|source| SchemaError::Migration {
            step: "read schema version",
            source,
        })?;

    match existing_version {
        Some(version) if version == SCHEMA_VERSION => {}
        Some(found) => {
            return Err(SchemaError::VersionMismatch {
                expected: SCHEMA_VERSION,
                found,
            });
        }
        None => {
            transaction
                .execute(
                    "INSERT INTO pawmap_schema_version (version) VALUES (?1)",
                    [SCHEMA_VERSION],
                )
                .map_err(|source| SchemaError::Migration {
                    step: "record schema version",
                    source,
                })?;
        }
    }

    Ok(())
}

fn run_migration_step(
    transaction: &Transaction<'_>,
    step: &'static str,
    sql: &str,
) -> Result<(), SchemaError> {
    transaction
        .execute(sql, [])
        .map(|_| ())
        .map_err(|source| SchemaError::Migration { step, source })
}

/// Errors raised when opening or initialising the PawMap schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Opening the database file failed.
    #[error("failed to open SQLite database at {path}")]
    Open {
        /// Requested database path.
        path: String,
        /// Source error from `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// A migration statement failed.
    #[error("failed to execute migration step '{step}'")]
    Migration {
        /// Name of the failed step.
        step: &'static str,
        /// Source error from `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// The database was created by a different schema version.
    #[error(
        "expected PawMap schema version {expected} but found {found}; apply migrations before retrying"
    )]
    VersionMismatch {
        /// Version this build understands.
        expected: i64,
        /// Version recorded in the database.
        found: i64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn initialising_twice_is_idempotent() {
        let mut conn = Connection::open_in_memory()
            .unwrap_or_else(|err| panic!("open database: {err}"));
        initialise_schema(&mut conn).unwrap_or_else(|err| panic!("first initialisation: {err}"));
        initialise_schema(&mut conn).unwrap_or_else(|err| panic!("second initialisation: {err}"));
        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM pawmap_schema_version", [], |row| {
                row.get(0)
            })
            .unwrap_or_else(|err| panic!("count versions: {err}"));
        assert_eq!(rows, 1);
    }

    #[rstest]
    fn rejects_unknown_schema_version() {
        let mut conn = Connection::open_in_memory()
            .unwrap_or_else(|err| panic!("open database: {err}"));
        initialise_schema(&mut conn).unwrap_or_else(|err| panic!("initialise schema: {err}"));
        conn.execute("UPDATE pawmap_schema_version SET version = 7", [])
            .unwrap_or_else(|err| panic!("bump version: {err}"));
        let err = initialise_schema(&mut conn)
            .err()
            .unwrap_or_else(|| panic!("version mismatch"));
        assert!(matches!(
            err,
            SchemaError::VersionMismatch {
                expected: SCHEMA_VERSION,
                found: 7
            }
        ));
    }
}
