//! Debate records - the immutable artifact of a completed room

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{OverallScore, ParticipantId, RoomKey, Score};

/// Label used for a drawn debate wherever a winner name is expected
pub const TIE_MARKER: &str = "Tie";

/// Declared result of a debate or of a single round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Winner(ParticipantId),
    Tie,
}

impl Outcome {
    pub fn winner(&self) -> Option<&ParticipantId> {
        match self {
            Outcome::Winner(id) => Some(id),
            Outcome::Tie => None,
        }
    }

    /// Winner's identifier, or [`TIE_MARKER`]
    pub fn label(&self) -> &str {
        match self {
            Outcome::Winner(id) => id.as_str(),
            Outcome::Tie => TIE_MARKER,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Whether the final verdict came from the oracle or the local fallback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictSource {
    Oracle,
    Fallback,
}

/// One participant's side of a finished debate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantRecord {
    pub id: ParticipantId,
    pub arguments: Vec<String>,
    pub turn_scores: Vec<Score>,
    pub overall: OverallScore,
    pub rounds_won: u32,
}

/// Side-by-side scores for one round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    pub round: u32,
    pub participant1: Score,
    pub participant2: Score,
    pub winner: Outcome,
}

/// Final, immutable result of a debate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebateRecord {
    pub room_key: Option<RoomKey>,
    pub topic: String,
    pub participant1: ParticipantRecord,
    pub participant2: ParticipantRecord,
    pub rounds: Vec<RoundRecord>,
    pub outcome: Outcome,
    pub reason: String,
    pub verdict_source: VerdictSource,
    pub completed_at: DateTime<Utc>,
}

impl DebateRecord {
    /// Storage key: `debate_<room key>`, or a timestamp when the debate had no room
    pub fn archive_key(&self) -> String {
        match &self.room_key {
            Some(key) => format!("debate_{}", key),
            None => format!("debate_{}", self.completed_at.timestamp()),
        }
    }

    /// The losing participant, if the debate was not a tie
    pub fn loser(&self) -> Option<&ParticipantId> {
        let winner = self.outcome.winner()?;
        if winner == &self.participant1.id {
            Some(&self.participant2.id)
        } else {
            Some(&self.participant1.id)
        }
    }

    /// Rating change applied to both players: difference in rounds won
    pub fn rating_delta(&self) -> u32 {
        self.participant1.rounds_won.abs_diff(self.participant2.rounds_won)
    }
}
