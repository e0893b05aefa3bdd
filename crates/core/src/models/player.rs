//! Player profile model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered debater and their running record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: Uuid,
    pub username: String,
    pub total_score: i64,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub games_played: u32,
    pub created_at: DateTime<Utc>,
}

impl Player {
    pub fn new(username: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            username,
            total_score: 0,
            wins: 0,
            losses: 0,
            draws: 0,
            games_played: 0,
            created_at: Utc::now(),
        }
    }
}
