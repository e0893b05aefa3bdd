//! Player profile storage

use rusqlite::{params, Connection, Row};
use tracing::{info, instrument};

use super::parse::{parse_datetime, parse_uuid, OptionalExt};
use crate::error::{Error, Result};
use crate::models::{Player, TIE_MARKER};

const PLAYER_COLUMNS: &str =
    "id, username, total_score, wins, losses, draws, games_played, created_at";

pub struct PlayerStore<'a> {
    conn: &'a Connection,
}

fn player_from_row(row: &Row<'_>) -> rusqlite::Result<Player> {
    Ok(Player {
        id: parse_uuid(&row.get::<_, String>(0)?)?,
        username: row.get(1)?,
        total_score: row.get(2)?,
        wins: row.get(3)?,
        losses: row.get(4)?,
        draws: row.get(5)?,
        games_played: row.get(6)?,
        created_at: parse_datetime(&row.get::<_, String>(7)?)?,
    })
}

impl<'a> PlayerStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Register a new player. Usernames are unique, case-insensitively.
    #[instrument(skip(self))]
    pub fn create(&self, username: &str) -> Result<Player> {
        let username = username.trim();
        if username.is_empty() {
            return Err(Error::Validation("username is required".into()));
        }
        if username.eq_ignore_ascii_case(TIE_MARKER) {
            return Err(Error::Validation(format!("{} is a reserved name", TIE_MARKER)));
        }
        if self.exists(username)? {
            return Err(Error::PlayerExists(username.to_string()));
        }

        let player = Player::new(username.to_string());
        self.conn.execute(
            &format!("INSERT INTO players ({PLAYER_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"),
            params![
                player.id.to_string(),
                player.username,
                player.total_score,
                player.wins,
                player.losses,
                player.draws,
                player.games_played,
                player.created_at.to_rfc3339(),
            ],
        )?;
        info!(username = %player.username, "Player registered");
        Ok(player)
    }

    #[instrument(skip(self))]
    pub fn find_by_username(&self, username: &str) -> Result<Option<Player>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {PLAYER_COLUMNS} FROM players WHERE username = ?1"))?;
        let player = stmt
            .query_row(params![username.trim()], player_from_row)
            .optional()?;
        Ok(player)
    }

    pub fn exists(&self, username: &str) -> Result<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM players WHERE username = ?1",
                params![username.trim()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Apply a decisive result: winner gains `delta`, loser drops by it
    #[instrument(skip(self))]
    pub fn record_result(&self, winner: &str, loser: &str, delta: u32) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        let delta = i64::from(delta);
        let won = tx.execute(
            "UPDATE players SET total_score = total_score + ?1, wins = wins + 1,
                games_played = games_played + 1 WHERE username = ?2",
            params![delta, winner],
        )?;
        if won == 0 {
            return Err(Error::PlayerNotFound(winner.to_string()));
        }
        let lost = tx.execute(
            "UPDATE players SET total_score = total_score - ?1, losses = losses + 1,
                games_played = games_played + 1 WHERE username = ?2",
            params![delta, loser],
        )?;
        if lost == 0 {
            return Err(Error::PlayerNotFound(loser.to_string()));
        }
        tx.commit()?;
        Ok(())
    }

    /// Apply a drawn result to both players
    #[instrument(skip(self))]
    pub fn record_draw(&self, first: &str, second: &str) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        for username in [first, second] {
            let updated = tx.execute(
                "UPDATE players SET draws = draws + 1, games_played = games_played + 1
                    WHERE username = ?1",
                params![username],
            )?;
            if updated == 0 {
                return Err(Error::PlayerNotFound(username.to_string()));
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Highest total score first
    pub fn leaderboard(&self, limit: u32) -> Result<Vec<Player>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PLAYER_COLUMNS} FROM players ORDER BY total_score DESC, wins DESC, username LIMIT ?1"
        ))?;
        let players = stmt
            .query_map(params![limit], player_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(players)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::Error;
    use crate::storage::Database;

    #[test]
    fn test_create_and_find() {
        let db = Database::open_in_memory().unwrap();
        let created = db.players().create("alice").unwrap();
        let found = db.players().find_by_username("alice").unwrap().unwrap();
        assert_eq!(created, found);
        assert_eq!(found.games_played, 0);
    }

    #[test]
    fn test_duplicate_username_rejected() {
        let db = Database::open_in_memory().unwrap();
        db.players().create("alice").unwrap();
        let err = db.players().create("ALICE").unwrap_err();
        assert!(matches!(err, Error::PlayerExists(_)));
    }

    #[test]
    fn test_blank_and_reserved_usernames_rejected() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(db.players().create("  "), Err(Error::Validation(_))));
        assert!(matches!(db.players().create("TIE"), Err(Error::Validation(_))));
    }

    #[test]
    fn test_record_result_moves_scores() {
        let db = Database::open_in_memory().unwrap();
        db.players().create("alice").unwrap();
        db.players().create("bob").unwrap();

        db.players().record_result("alice", "bob", 3).unwrap();

        let alice = db.players().find_by_username("alice").unwrap().unwrap();
        let bob = db.players().find_by_username("bob").unwrap().unwrap();
        assert_eq!((alice.total_score, alice.wins, alice.games_played), (3, 1, 1));
        assert_eq!((bob.total_score, bob.losses, bob.games_played), (-3, 1, 1));
    }

    #[test]
    fn test_record_result_unknown_player_rolls_back() {
        let db = Database::open_in_memory().unwrap();
        db.players().create("alice").unwrap();

        let err = db.players().record_result("alice", "ghost", 2).unwrap_err();
        assert!(matches!(err, Error::PlayerNotFound(_)));

        let alice = db.players().find_by_username("alice").unwrap().unwrap();
        assert_eq!(alice.wins, 0);
        assert_eq!(alice.total_score, 0);
    }

    #[test]
    fn test_record_draw() {
        let db = Database::open_in_memory().unwrap();
        db.players().create("alice").unwrap();
        db.players().create("bob").unwrap();
        db.players().record_draw("alice", "bob").unwrap();

        for name in ["alice", "bob"] {
            let p = db.players().find_by_username(name).unwrap().unwrap();
            assert_eq!((p.draws, p.games_played, p.total_score), (1, 1, 0));
        }
    }

    #[test]
    fn test_leaderboard_order() {
        let db = Database::open_in_memory().unwrap();
        for name in ["alice", "bob", "carol"] {
            db.players().create(name).unwrap();
        }
        db.players().record_result("carol", "alice", 4).unwrap();
        db.players().record_result("bob", "alice", 1).unwrap();

        let board = db.players().leaderboard(2).unwrap();
        let names: Vec<_> = board.iter().map(|p| p.username.as_str()).collect();
        assert_eq!(names, vec!["carol", "bob"]);
    }
}
