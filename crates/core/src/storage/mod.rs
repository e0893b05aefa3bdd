//! SQLite storage layer for player profiles

mod migrations;
mod parse;
mod players;
mod traits;

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use rusqlite::Connection;
use tracing::instrument;

use crate::error::Result;
use crate::models::Player;

pub use players::PlayerStore;
pub use traits::PlayerDirectory;

/// Main database handle
pub struct Database {
    conn: Connection,
    version: u32,
}

impl Database {
    /// Open or create database at the given path
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?)
    }

    /// Open in-memory database (for testing)
    #[instrument]
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        let version = migrations::upgrade(&conn)?;
        Ok(Self { conn, version })
    }

    /// Schema version reached when the database was opened
    pub fn schema_version(&self) -> u32 {
        self.version
    }

    pub fn players(&self) -> PlayerStore<'_> {
        PlayerStore::new(&self.conn)
    }
}

/// A [`Database`] shareable across tasks
pub struct SharedDatabase {
    db: Mutex<Database>,
}

impl SharedDatabase {
    pub fn new(db: Database) -> Self {
        Self { db: Mutex::new(db) }
    }

    fn lock(&self) -> MutexGuard<'_, Database> {
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PlayerDirectory for SharedDatabase {
    fn create_player(&self, username: &str) -> Result<Player> {
        self.lock().players().create(username)
    }

    fn get_player(&self, username: &str) -> Result<Option<Player>> {
        self.lock().players().find_by_username(username)
    }

    fn player_exists(&self, username: &str) -> Result<bool> {
        self.lock().players().exists(username)
    }

    fn record_result(&self, winner: &str, loser: &str, delta: u32) -> Result<()> {
        self.lock().players().record_result(winner, loser, delta)
    }

    fn record_draw(&self, first: &str, second: &str) -> Result<()> {
        self.lock().players().record_draw(first, second)
    }

    fn leaderboard(&self, limit: u32) -> Result<Vec<Player>> {
        self.lock().players().leaderboard(limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_schema_version_after_open() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.schema_version(), 2);
    }

    #[test]
    fn test_reopen_keeps_players() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("agora.db");
        {
            let db = Database::open(&path).unwrap();
            db.players().create("alice").unwrap();
        }
        let db = Database::open(&path).unwrap();
        assert!(db.players().exists("alice").unwrap());
    }

    #[test]
    fn test_shared_database_as_directory() {
        let shared = SharedDatabase::new(Database::open_in_memory().unwrap());
        let directory: &dyn PlayerDirectory = &shared;
        directory.create_player("alice").unwrap();
        assert!(directory.player_exists("alice").unwrap());
        assert!(!directory.player_exists("bob").unwrap());
    }
}
