// Copyright (C) 2026  Caprica Software Limited
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Local mapset library.
//!
//! The search coordinator needs one thing from the player's installed
//! content: whether a given mapset is already owned, so owned results can be
//! excluded from a search unless the user asks to see them. [`LocalLibrary`]
//! is that boundary; [`SqliteLibrary`] is the SQLite-backed implementation
//! that tracks installed mapsets on disk.
//!
//! # Performance
//!
//! Queries use [`rusqlite::Connection::prepare_cached`] to avoid re-parsing
//! SQL on the hot ownership check, which runs once per result row while the
//! result set's mutation lock is held.

use anyhow::Result;
use rusqlite::{Connection, params};
use std::sync::Mutex;
use tracing::warn;

use crate::model::{DownloadableMapset, MapsetId};

/// Ownership check against the player's installed content.
///
/// Called from search worker threads; implementations must be cheap enough
/// to run once per result row.
pub trait LocalLibrary: Send + Sync {
    fn is_owned(&self, id: MapsetId) -> bool;
}

/// SQLite-backed registry of installed mapsets.
pub struct SqliteLibrary {
    conn: Mutex<Connection>,
}

impl SqliteLibrary {
    /// Opens (or creates) the library database and configures it.
    ///
    /// Enables WAL mode for concurrent readers, relaxes synchronous mode,
    /// and ensures the schema exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened, WAL mode cannot be
    /// enabled, or the schema cannot be created.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;

        let journal_mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |r| r.get(0))?;
        if journal_mode != "wal" {
            anyhow::bail!(
                "Failed to switch to WAL mode. Current mode: {}",
                journal_mode
            );
        }

        conn.execute_batch(
            "
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;

        conn.set_prepared_statement_cache_capacity(16);

        create_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Records a mapset as installed.
    pub fn add_mapset(&self, mapset: &DownloadableMapset) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let mut statement = conn.prepare_cached(
            "INSERT OR REPLACE INTO mapsets (id, artist, title, creator) VALUES (?1, ?2, ?3, ?4)",
        )?;
        statement.execute(params![
            mapset.id.0,
            mapset.artist,
            mapset.title,
            mapset.creator
        ])?;

        Ok(())
    }

    /// Removes a mapset from the installed registry.
    pub fn remove_mapset(&self, id: MapsetId) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let mut statement = conn.prepare_cached("DELETE FROM mapsets WHERE id = ?1")?;
        statement.execute(params![id.0])?;

        Ok(())
    }

    /// All installed mapset identifiers, ascending.
    pub fn owned_ids(&self) -> Result<Vec<MapsetId>> {
        let conn = self.conn.lock().unwrap();
        let mut statement = conn.prepare_cached("SELECT id FROM mapsets ORDER BY id")?;

        let ids = statement
            .query_map([], |row| row.get::<_, i32>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ids.into_iter().map(MapsetId).collect())
    }

    fn query_owned(&self, id: MapsetId) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let mut statement =
            conn.prepare_cached("SELECT EXISTS(SELECT 1 FROM mapsets WHERE id = ?1)")?;
        let owned: bool = statement.query_row(params![id.0], |row| row.get(0))?;

        Ok(owned)
    }
}

impl LocalLibrary for SqliteLibrary {
    /// A failed lookup is reported as "not owned" so a database hiccup can
    /// only ever show too many results, never hide them.
    fn is_owned(&self, id: MapsetId) -> bool {
        match self.query_owned(id) {
            Ok(owned) => owned,
            Err(e) => {
                warn!(mapset = %id, error = %e, "ownership lookup failed");
                false
            }
        }
    }
}

/// Create the database schema.
fn create_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "BEGIN;

        CREATE TABLE IF NOT EXISTS mapsets (
            id INTEGER PRIMARY KEY,
            artist TEXT NOT NULL,
            title TEXT NOT NULL,
            creator TEXT NOT NULL
        );

        COMMIT;",
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{LocalLibrary, SqliteLibrary};
    use crate::model::{DownloadableMapset, MapsetId, RankedStatus};

    fn mapset(id: i32) -> DownloadableMapset {
        DownloadableMapset {
            id: MapsetId(id),
            title: "title".to_string(),
            artist: "artist".to_string(),
            creator: "creator".to_string(),
            ranked_status: RankedStatus::Ranked,
            game_modes: vec![],
            min_difficulty: 1.0,
            max_difficulty: 5.0,
            bpm: 120.0,
            max_length_secs: 90,
            max_long_note_percent: 0,
            play_count: 0,
            date_submitted: "01-01-2024".to_string(),
        }
    }

    fn temp_library() -> (tempfile::TempDir, SqliteLibrary) {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("mapsets.db");
        let library = SqliteLibrary::open(path.to_str().unwrap()).expect("open library");
        (dir, library)
    }

    #[test]
    fn add_query_remove_round_trip() {
        let (_dir, library) = temp_library();

        assert!(!library.is_owned(MapsetId(7)));

        library.add_mapset(&mapset(7)).unwrap();
        assert!(library.is_owned(MapsetId(7)));
        assert_eq!(library.owned_ids().unwrap(), vec![MapsetId(7)]);

        library.remove_mapset(MapsetId(7)).unwrap();
        assert!(!library.is_owned(MapsetId(7)));
        assert!(library.owned_ids().unwrap().is_empty());
    }

    #[test]
    fn re_adding_a_mapset_is_idempotent() {
        let (_dir, library) = temp_library();

        library.add_mapset(&mapset(3)).unwrap();
        library.add_mapset(&mapset(3)).unwrap();

        assert_eq!(library.owned_ids().unwrap(), vec![MapsetId(3)]);
    }

    #[test]
    fn owned_ids_are_sorted() {
        let (_dir, library) = temp_library();

        library.add_mapset(&mapset(20)).unwrap();
        library.add_mapset(&mapset(5)).unwrap();
        library.add_mapset(&mapset(11)).unwrap();

        assert_eq!(
            library.owned_ids().unwrap(),
            vec![MapsetId(5), MapsetId(11), MapsetId(20)]
        );
    }
}
