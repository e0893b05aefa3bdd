//! Scoring - turn scores and the final verdict
//!
//! The oracle is an external, unreliable collaborator. Everything it returns
//! is checked before use and every failure degrades to a locally computed
//! value, so a completed debate always ends with a winner.

mod openrouter;
mod orchestrator;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::{OverallScore, Outcome, ParticipantId, Score};

pub use openrouter::OpenRouterOracle;
pub use orchestrator::{default_verdict, Evaluation, ScoredSide, ScoringOrchestrator};

/// Failure of a single oracle call. Never leaves the scoring layer.
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("Oracle unavailable: {0}")]
    Unavailable(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Oracle returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Oracle returned no content")]
    EmptyResponse,

    #[error("Malformed oracle output: {0}")]
    Malformed(String),

    #[error("Oracle call timed out after {0:?}")]
    Timeout(Duration),
}

/// One participant's scores as presented for judgment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantSummary {
    pub id: ParticipantId,
    pub turn_scores: Vec<Score>,
    pub overall: OverallScore,
}

/// Everything the oracle sees when asked for a verdict
#[derive(Debug, Clone, PartialEq)]
pub struct JudgmentRequest {
    pub topic: String,
    pub participant1: ParticipantSummary,
    pub participant2: ParticipantSummary,
    pub default_winner: Outcome,
    pub default_reason: String,
}

/// Raw verdict as the oracle states it; `winner` is a participant id or "Tie"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Judgment {
    pub winner: String,
    pub reason: String,
}

#[async_trait]
pub trait ScoringOracle: Send + Sync {
    /// Score one argument on logic, relevance and persuasiveness
    async fn score_argument(
        &self,
        argument: &str,
        topic: &str,
        round: Option<u32>,
    ) -> Result<Score, OracleError>;

    /// Declare a winner given both participants' scores
    async fn judge(&self, request: &JudgmentRequest) -> Result<Judgment, OracleError>;
}
