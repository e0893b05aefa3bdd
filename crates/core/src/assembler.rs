//! Result assembly - turn a scored debate into its final record

use chrono::{DateTime, Utc};

use crate::invariants::assert_record_invariants;
use crate::models::{DebateRecord, ParticipantRecord, RoomKey};
use crate::scoring::{Evaluation, ScoredSide};

fn side(scored: ScoredSide) -> ParticipantRecord {
    ParticipantRecord {
        id: scored.id,
        arguments: scored.arguments,
        turn_scores: scored.turn_scores,
        overall: scored.overall,
        rounds_won: scored.rounds_won,
    }
}

/// Structure an evaluation into a [`DebateRecord`]. Deterministic in its inputs.
pub fn assemble(
    topic: String,
    room_key: Option<RoomKey>,
    evaluation: Evaluation,
    completed_at: DateTime<Utc>,
) -> DebateRecord {
    let record = DebateRecord {
        room_key,
        topic,
        participant1: side(evaluation.participant1),
        participant2: side(evaluation.participant2),
        rounds: evaluation.rounds,
        outcome: evaluation.outcome,
        reason: evaluation.reason,
        verdict_source: evaluation.verdict_source,
        completed_at,
    };
    assert_record_invariants(&record);
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OverallScore, Outcome, ParticipantId, RoundRecord, Score, VerdictSource};

    fn scored(id: &str, score: Score, rounds_won: u32) -> ScoredSide {
        ScoredSide {
            id: ParticipantId::new(id),
            arguments: vec![format!("{id} argues")],
            turn_scores: vec![score],
            overall: OverallScore::from_turns(&[score]),
            rounds_won,
        }
    }

    fn evaluation() -> Evaluation {
        let a = Score::new(8.0, 8.0, 8.0);
        let b = Score::new(6.0, 6.0, 6.0);
        Evaluation {
            participant1: scored("alice", a, 1),
            participant2: scored("bob", b, 0),
            rounds: vec![RoundRecord {
                round: 1,
                participant1: a,
                participant2: b,
                winner: Outcome::Winner(ParticipantId::new("alice")),
            }],
            outcome: Outcome::Winner(ParticipantId::new("alice")),
            reason: "alice had a higher overall score (24.0 vs 18.0).".into(),
            verdict_source: VerdictSource::Fallback,
        }
    }

    #[test]
    fn test_assemble_is_deterministic() {
        let at = Utc::now();
        let key = Some(RoomKey::new("ASM001"));
        let first = assemble("topic".into(), key.clone(), evaluation(), at);
        let second = assemble("topic".into(), key, evaluation(), at);
        assert_eq!(first, second);
    }

    #[test]
    fn test_assemble_keeps_sides_in_order() {
        let record = assemble("topic".into(), None, evaluation(), Utc::now());
        assert_eq!(record.participant1.id.as_str(), "alice");
        assert_eq!(record.participant2.arguments, vec!["bob argues"]);
        assert_eq!(record.loser(), Some(&ParticipantId::new("bob")));
        assert_eq!(record.rating_delta(), 1);
    }
}
