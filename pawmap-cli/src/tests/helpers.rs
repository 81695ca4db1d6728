//! Test helpers for seeding on-disk PawMap databases.

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, TimeZone, Utc};
use pawmap_core::{
    Author, Place, PlaceCategory, PlaceId, Rating, Review, ReviewId, SqliteStore, UserId,
};
use tempfile::TempDir;

/// Temporary directory holding a database and any exported files.
pub(super) struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().unwrap_or_else(|err| panic!("create temporary directory: {err}"));
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
            .unwrap_or_else(|path| panic!("non-UTF-8 temporary path {}", path.display()));
        Self { _dir: dir, root }
    }

    pub(super) fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Database path one directory below the root, so opening it must create
    /// the directory first.
    pub(super) fn database(&self) -> Utf8PathBuf {
        self.root.join("state/pawmap.db")
    }

    /// Open the database and seed two places with reviews.
    pub(super) fn seeded_store(&self) -> SqliteStore {
        pawmap_fs::ensure_parent_dir(&self.database())
            .unwrap_or_else(|err| panic!("create database directory: {err}"));
        let store = SqliteStore::open(self.database().as_std_path())
            .unwrap_or_else(|err| panic!("open store: {err}"));
        let owner = Author::new(user("owner"), "Dana");
        let visitor = Author::new(user("visitor"), "Eli");
        let harbour = Place::new(
            place_id("harbour"),
            "Harbour Walk",
            PlaceCategory::Trail,
            owner.clone(),
        )
        .unwrap_or_else(|err| panic!("place harbour: {err}"))
        .verified();
        let orchard = Place::new(
            place_id("orchard"),
            "Orchard Cafe",
            PlaceCategory::Cafe,
            owner.clone(),
        )
        .unwrap_or_else(|err| panic!("place orchard: {err}"));
        for place in [&harbour, &orchard] {
            store
                .insert_place(place)
                .unwrap_or_else(|err| panic!("insert place: {err}"));
        }
        for entry in [
            review("r1", "harbour", 5, &visitor),
            review("r2", "harbour", 4, &owner),
            review("r3", "orchard", 3, &visitor),
        ] {
            store
                .insert_review(&entry)
                .unwrap_or_else(|err| panic!("insert review: {err}"));
        }
        store
    }
}

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 4, 12, 7, 45, 0)
        .single()
        .unwrap_or_else(|| panic!("valid timestamp"))
}

pub(super) fn user(raw: &str) -> UserId {
    UserId::new(raw).unwrap_or_else(|err| panic!("user id {raw}: {err}"))
}

pub(super) fn place_id(raw: &str) -> PlaceId {
    PlaceId::new(raw).unwrap_or_else(|err| panic!("place id {raw}: {err}"))
}

fn review(id: &str, place: &str, stars: u8, author: &Author) -> Review {
    Review::new(
        ReviewId::new(id).unwrap_or_else(|err| panic!("review id: {err}")),
        place_id(place),
        Rating::new(stars).unwrap_or_else(|err| panic!("rating: {err}")),
        now(),
        author.clone(),
    )
}

/// Decode what a command wrote to its output buffer.
pub(super) fn lines(output: Vec<u8>) -> Vec<String> {
    String::from_utf8(output)
        .unwrap_or_else(|err| panic!("command output is UTF-8: {err}"))
        .lines()
        .map(str::to_owned)
        .collect()
}
