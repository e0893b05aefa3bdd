//! Scoring orchestrator
//!
//! Scores every turn of a completed debate, averages them, and asks the oracle
//! for a verdict. Runs with no room lock held. Every oracle call is bounded by
//! a timeout, and any failure is replaced by a deterministic local value.

use std::cmp::Ordering;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, info, instrument, warn};

use super::{Judgment, JudgmentRequest, OracleError, ParticipantSummary, ScoringOracle};
use crate::models::{
    OverallScore, Outcome, ParticipantId, RoundRecord, Score, VerdictSource, TIE_MARKER,
};
use crate::room::{DebateTranscript, TranscriptSide};

/// Default bound on a single oracle call
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Scores and aggregate for one participant
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredSide {
    pub id: ParticipantId,
    pub arguments: Vec<String>,
    pub turn_scores: Vec<Score>,
    pub overall: OverallScore,
    pub rounds_won: u32,
}

impl ScoredSide {
    fn summary(&self) -> ParticipantSummary {
        ParticipantSummary {
            id: self.id.clone(),
            turn_scores: self.turn_scores.clone(),
            overall: self.overall,
        }
    }
}

/// Output of a full scoring pass
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub participant1: ScoredSide,
    pub participant2: ScoredSide,
    pub rounds: Vec<RoundRecord>,
    pub outcome: Outcome,
    pub reason: String,
    pub verdict_source: VerdictSource,
}

/// Higher overall total wins; equal totals are a tie
pub fn default_verdict(
    participant1: &ParticipantId,
    total1: f64,
    participant2: &ParticipantId,
    total2: f64,
) -> (Outcome, String) {
    match total1.partial_cmp(&total2) {
        Some(Ordering::Greater) => (
            Outcome::Winner(participant1.clone()),
            format!(
                "{} had a higher overall score ({:.1} vs {:.1}).",
                participant1, total1, total2
            ),
        ),
        Some(Ordering::Less) => (
            Outcome::Winner(participant2.clone()),
            format!(
                "{} had a higher overall score ({:.1} vs {:.1}).",
                participant2, total2, total1
            ),
        ),
        _ => (
            Outcome::Tie,
            format!("Both players had equal scores of {:.1}.", total1),
        ),
    }
}

/// Drives the oracle for one debate at a time
pub struct ScoringOrchestrator {
    oracle: Arc<dyn ScoringOracle>,
    call_timeout: Duration,
}

impl ScoringOrchestrator {
    pub fn new(oracle: Arc<dyn ScoringOracle>) -> Self {
        Self {
            oracle,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// Score and judge a completed debate. Infallible by construction.
    #[instrument(skip_all, fields(room_key = ?transcript.room_key))]
    pub async fn evaluate(&self, transcript: &DebateTranscript) -> Evaluation {
        let topic = transcript.topic.as_str();
        let (scores1, scores2) = futures::join!(
            self.score_side(topic, &transcript.participant1),
            self.score_side(topic, &transcript.participant2),
        );

        let mut side1 = scored(&transcript.participant1, scores1);
        let mut side2 = scored(&transcript.participant2, scores2);
        let rounds = round_breakdown(&mut side1, &mut side2);

        let (default_winner, default_reason) =
            default_verdict(&side1.id, side1.overall.total(), &side2.id, side2.overall.total());

        let request = JudgmentRequest {
            topic: transcript.topic.clone(),
            participant1: side1.summary(),
            participant2: side2.summary(),
            default_winner: default_winner.clone(),
            default_reason: default_reason.clone(),
        };

        let judged = self
            .bounded(self.oracle.judge(&request))
            .await
            .and_then(|j| accept_judgment(j, &side1.id, &side2.id));

        let (outcome, reason, verdict_source) = match judged {
            Ok((outcome, reason)) => (outcome, reason, VerdictSource::Oracle),
            Err(e) => {
                warn!(error = %e, "Judgment unavailable, using score-based verdict");
                (default_winner, default_reason, VerdictSource::Fallback)
            }
        };

        info!(
            outcome = %outcome,
            total1 = side1.overall.total(),
            total2 = side2.overall.total(),
            source = ?verdict_source,
            "Debate scored"
        );

        Evaluation {
            participant1: side1,
            participant2: side2,
            rounds,
            outcome,
            reason,
            verdict_source,
        }
    }

    async fn score_side(&self, topic: &str, side: &TranscriptSide) -> Vec<Score> {
        let turns = side
            .arguments
            .iter()
            .enumerate()
            .map(|(i, argument)| self.score_turn(&side.id, argument, topic, i as u32 + 1));
        join_all(turns).await
    }

    async fn score_turn(
        &self,
        participant: &ParticipantId,
        argument: &str,
        topic: &str,
        round: u32,
    ) -> Score {
        match self.bounded(self.oracle.score_argument(argument, topic, Some(round))).await {
            Ok(score) if score.is_valid() => {
                debug!(participant = %participant, round, total = score.total(), "Turn scored");
                score
            }
            Ok(score) => {
                warn!(participant = %participant, round, ?score, "Score out of range, using neutral score");
                Score::NEUTRAL
            }
            Err(e) => {
                warn!(participant = %participant, round, error = %e, "Scoring failed, using neutral score");
                Score::NEUTRAL
            }
        }
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, OracleError>>,
    ) -> Result<T, OracleError> {
        match tokio::time::timeout(self.call_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(OracleError::Timeout(self.call_timeout)),
        }
    }
}

fn scored(side: &TranscriptSide, turn_scores: Vec<Score>) -> ScoredSide {
    ScoredSide {
        id: side.id.clone(),
        arguments: side.arguments.clone(),
        overall: OverallScore::from_turns(&turn_scores),
        turn_scores,
        rounds_won: 0,
    }
}

/// Per-round winners by turn total, tallying rounds won on each side
fn round_breakdown(side1: &mut ScoredSide, side2: &mut ScoredSide) -> Vec<RoundRecord> {
    let mut rounds = Vec::with_capacity(side1.turn_scores.len());
    for (i, (s1, s2)) in side1.turn_scores.iter().zip(&side2.turn_scores).enumerate() {
        let winner = match s1.total().partial_cmp(&s2.total()) {
            Some(Ordering::Greater) => {
                side1.rounds_won += 1;
                Outcome::Winner(side1.id.clone())
            }
            Some(Ordering::Less) => {
                side2.rounds_won += 1;
                Outcome::Winner(side2.id.clone())
            }
            _ => Outcome::Tie,
        };
        rounds.push(RoundRecord {
            round: i as u32 + 1,
            participant1: *s1,
            participant2: *s2,
            winner,
        });
    }
    rounds
}

/// Map the oracle's verdict onto a participant, rejecting anything else
fn accept_judgment(
    judgment: Judgment,
    participant1: &ParticipantId,
    participant2: &ParticipantId,
) -> Result<(Outcome, String), OracleError> {
    let reason = judgment.reason.trim();
    if reason.is_empty() {
        return Err(OracleError::Malformed("judgment has an empty reason".into()));
    }

    // Participant names take precedence over the tie marker
    let winner = judgment.winner.trim();
    let outcome = if let Some(id) = [participant1, participant2]
        .into_iter()
        .find(|id| id.as_str() == winner)
        .or_else(|| {
            [participant1, participant2]
                .into_iter()
                .find(|id| id.as_str().eq_ignore_ascii_case(winner))
        })
    {
        Outcome::Winner(id.clone())
    } else if winner.eq_ignore_ascii_case(TIE_MARKER) {
        Outcome::Tie
    } else {
        return Err(OracleError::Malformed(format!(
            "judgment names unknown winner {:?}",
            winner
        )));
    };

    Ok((outcome, reason.to_string()))
}
