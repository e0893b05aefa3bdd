//! Storage repository traits
//!
//! The debate service only sees these interfaces, so tests can swap the
//! SQLite implementation for an in-memory one.

use crate::error::Result;
use crate::models::Player;

/// Registered players and their running records
pub trait PlayerDirectory: Send + Sync {
    /// Register a new player
    fn create_player(&self, username: &str) -> Result<Player>;

    fn get_player(&self, username: &str) -> Result<Option<Player>>;

    fn player_exists(&self, username: &str) -> Result<bool>;

    /// Winner gains `delta` points and a win; loser loses `delta` and takes a loss
    fn record_result(&self, winner: &str, loser: &str, delta: u32) -> Result<()>;

    /// Both players get a draw
    fn record_draw(&self, first: &str, second: &str) -> Result<()>;

    /// Top `limit` players by total score
    fn leaderboard(&self, limit: u32) -> Result<Vec<Player>>;
}
