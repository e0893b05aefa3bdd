//! Schema upgrades for the player database
//!
//! Each step runs in its own transaction together with its bookkeeping row,
//! so a failed upgrade leaves the previous version intact.

use chrono::Utc;
use rusqlite::{params, Connection};
use tracing::{debug, info, instrument};

use crate::error::Result;

struct Step {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const STEPS: &[Step] = &[
    Step {
        version: 1,
        name: "players",
        sql: "CREATE TABLE IF NOT EXISTS players (
                  id TEXT PRIMARY KEY,
                  username TEXT NOT NULL UNIQUE COLLATE NOCASE,
                  total_score INTEGER NOT NULL DEFAULT 0,
                  wins INTEGER NOT NULL DEFAULT 0,
                  losses INTEGER NOT NULL DEFAULT 0,
                  draws INTEGER NOT NULL DEFAULT 0,
                  games_played INTEGER NOT NULL DEFAULT 0,
                  created_at TEXT NOT NULL
              );",
    },
    Step {
        version: 2,
        name: "leaderboard index",
        sql: "CREATE INDEX IF NOT EXISTS idx_players_score
                  ON players(total_score DESC, wins DESC);",
    },
];

/// Highest applied schema version, 0 for a fresh database
pub fn applied_version(conn: &Connection) -> Result<u32> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_versions (
             version INTEGER PRIMARY KEY,
             name TEXT NOT NULL,
             applied_at TEXT NOT NULL
         );",
    )?;
    let version: Option<u32> =
        conn.query_row("SELECT MAX(version) FROM schema_versions", [], |row| row.get(0))?;
    Ok(version.unwrap_or(0))
}

#[instrument(skip(conn))]
pub fn upgrade(conn: &Connection) -> Result<u32> {
    let start = applied_version(conn)?;
    let mut current = start;

    for step in STEPS.iter().skip_while(|s| s.version <= start) {
        debug!(version = step.version, name = step.name, "Applying schema step");
        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(step.sql)?;
        tx.execute(
            "INSERT INTO schema_versions (version, name, applied_at) VALUES (?1, ?2, ?3)",
            params![step.version, step.name, Utc::now().to_rfc3339()],
        )?;
        tx.commit()?;
        current = step.version;
    }

    if current != start {
        info!(from = start, to = current, "Player database upgraded");
    }
    Ok(current)
}
