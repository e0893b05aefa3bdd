//! Room state machine
//!
//! A room moves strictly `Waiting -> InProgress -> Completed`. The phase enum
//! carries the data valid for each state, so a current turn only exists while
//! the debate is in progress and the second ledger only exists once somebody
//! has joined.
//!
//! [`SharedRoom`] is the unit of mutual exclusion: `join` and `submit` each run
//! as a single critical section, and the submission that fills the last ledger
//! flips the room to `Completed` inside that same section. Only that caller
//! receives [`SubmitOutcome::Completed`], so scoring is claimed exactly once.

use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::invariants::assert_room_invariants;
use crate::ledger::TurnLedger;
use crate::models::{DebateRecord, ParticipantId, RoomKey, Seat};

/// Rounds per participant unless configured otherwise
pub const DEFAULT_ROUNDS: u32 = 5;

/// Longest accepted argument, in characters
pub const DEFAULT_MAX_ARGUMENT_CHARS: usize = 4000;

/// Per-room rules, fixed at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomRules {
    pub rounds_target: u32,
    pub max_argument_chars: usize,
}

impl Default for RoomRules {
    fn default() -> Self {
        Self {
            rounds_target: DEFAULT_ROUNDS,
            max_argument_chars: DEFAULT_MAX_ARGUMENT_CHARS,
        }
    }
}

impl RoomRules {
    pub fn with_rounds(mut self, rounds_target: u32) -> Self {
        self.rounds_target = rounds_target;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.rounds_target == 0 {
            return Err(Error::Validation("a debate needs at least one round".into()));
        }
        if self.max_argument_chars == 0 {
            return Err(Error::Validation("argument length limit must be positive".into()));
        }
        Ok(())
    }
}

/// Externally visible lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    Waiting,
    InProgress,
    Completed,
}

/// Both seats filled
#[derive(Debug)]
struct Table {
    challenger: ParticipantId,
    ledgers: [TurnLedger; 2],
}

impl Table {
    fn is_complete(&self, rounds_target: u32) -> bool {
        self.ledgers.iter().all(|l| l.is_full(rounds_target))
    }
}

#[derive(Debug)]
enum Phase {
    Waiting { host_ledger: TurnLedger },
    InProgress { table: Table, turn: Seat },
    Completed { table: Table },
}

/// Result of an accepted submission
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Debate continues; `current_round` is the submitter's round just recorded
    InProgress {
        current_round: u32,
        next_turn: ParticipantId,
    },
    /// This submission completed the debate. The receiver owns scoring.
    Completed(DebateTranscript),
}

/// One side of a finished debate, handed to scoring
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptSide {
    pub id: ParticipantId,
    pub arguments: Vec<String>,
}

/// Everything scoring needs from a completed room
#[derive(Debug, Clone, PartialEq)]
pub struct DebateTranscript {
    pub room_key: Option<RoomKey>,
    pub topic: String,
    pub rounds_target: u32,
    pub participant1: TranscriptSide,
    pub participant2: TranscriptSide,
}

/// Arguments submitted so far by one participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerView {
    pub participant: ParticipantId,
    pub arguments: Vec<String>,
}

/// Point-in-time view of a room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub room_key: RoomKey,
    pub topic: String,
    pub status: RoomStatus,
    pub rounds_target: u32,
    pub participant1: ParticipantId,
    pub participant2: Option<ParticipantId>,
    pub current_turn: Option<ParticipantId>,
    pub arguments: Vec<LedgerView>,
    pub created_at: DateTime<Utc>,
    pub result: Option<DebateRecord>,
}

/// A single debate session
#[derive(Debug)]
pub struct Room {
    key: RoomKey,
    topic: String,
    rules: RoomRules,
    host: ParticipantId,
    created_at: DateTime<Utc>,
    phase: Phase,
}

impl Room {
    pub fn new(key: RoomKey, host: ParticipantId, topic: String, rules: RoomRules) -> Result<Self> {
        rules.validate()?;
        if host.is_blank() {
            return Err(Error::Validation("participant is required".into()));
        }
        let topic = topic.trim().to_string();
        if topic.is_empty() {
            return Err(Error::Validation("topic is required".into()));
        }

        Ok(Self {
            key,
            topic,
            rules,
            host,
            created_at: Utc::now(),
            phase: Phase::Waiting {
                host_ledger: TurnLedger::new(),
            },
        })
    }

    pub fn key(&self) -> &RoomKey {
        &self.key
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn rules(&self) -> RoomRules {
        self.rules
    }

    pub fn host(&self) -> &ParticipantId {
        &self.host
    }

    pub fn challenger(&self) -> Option<&ParticipantId> {
        match &self.phase {
            Phase::Waiting { .. } => None,
            Phase::InProgress { table, .. } | Phase::Completed { table } => Some(&table.challenger),
        }
    }

    pub fn participant(&self, seat: Seat) -> Option<&ParticipantId> {
        match seat {
            Seat::First => Some(&self.host),
            Seat::Second => self.challenger(),
        }
    }

    pub fn status(&self) -> RoomStatus {
        match self.phase {
            Phase::Waiting { .. } => RoomStatus::Waiting,
            Phase::InProgress { .. } => RoomStatus::InProgress,
            Phase::Completed { .. } => RoomStatus::Completed,
        }
    }

    /// Seat expected to submit next; only defined while in progress
    pub fn turn_seat(&self) -> Option<Seat> {
        match self.phase {
            Phase::InProgress { turn, .. } => Some(turn),
            _ => None,
        }
    }

    pub fn current_turn(&self) -> Option<&ParticipantId> {
        self.turn_seat().and_then(|seat| self.participant(seat))
    }

    /// Arguments recorded for a seat
    pub fn rounds_submitted(&self, seat: Seat) -> u32 {
        match (&self.phase, seat) {
            (Phase::Waiting { host_ledger }, Seat::First) => host_ledger.rounds(),
            (Phase::Waiting { .. }, Seat::Second) => 0,
            (Phase::InProgress { table, .. } | Phase::Completed { table }, seat) => {
                table.ledgers[seat.index()].rounds()
            }
        }
    }

    /// Seat the second participant and start the debate with the host to move
    pub fn join(&mut self, challenger: ParticipantId) -> Result<()> {
        if !matches!(self.phase, Phase::Waiting { .. }) {
            return Err(Error::RoomFull(self.key.clone()));
        }
        if challenger.is_blank() {
            return Err(Error::Validation("participant is required".into()));
        }
        if challenger.same_player(&self.host) {
            return Err(Error::Validation(format!(
                "{} cannot debate against themselves",
                challenger
            )));
        }

        info!(room_key = %self.key, host = %self.host, challenger = %challenger, "Debate started");
        self.phase = match self.take_phase() {
            Phase::Waiting { host_ledger } => Phase::InProgress {
                table: Table {
                    challenger,
                    ledgers: [host_ledger, TurnLedger::new()],
                },
                turn: Seat::First,
            },
            other => other,
        };

        assert_room_invariants(self);
        Ok(())
    }

    /// Check turn, append, flip turn and detect completion as one step
    pub fn submit(&mut self, participant: &ParticipantId, argument: String) -> Result<SubmitOutcome> {
        let rounds_target = self.rules.rounds_target;

        let (table, turn) = match &mut self.phase {
            Phase::Waiting { .. } => return Err(Error::RoomNotInProgress(self.key.clone())),
            Phase::Completed { .. } => return Err(Error::RoomAlreadyCompleted(self.key.clone())),
            Phase::InProgress { table, turn } => (table, turn),
        };

        let seat = *turn;
        let expected = match seat {
            Seat::First => &self.host,
            Seat::Second => &table.challenger,
        };
        if !expected.same_player(participant) {
            return Err(Error::NotYourTurn {
                expected: expected.clone(),
                actual: participant.clone(),
            });
        }

        let argument = validate_argument(argument, self.rules.max_argument_chars)?;
        let round = table.ledgers[seat.index()]
            .append(argument, rounds_target)
            .ok_or_else(|| Error::RoomAlreadyCompleted(self.key.clone()))?;
        *turn = seat.other();
        debug!(room_key = %self.key, participant = %participant, round, "Argument recorded");

        let outcome = if table.is_complete(rounds_target) {
            SubmitOutcome::Completed(DebateTranscript {
                room_key: Some(self.key.clone()),
                topic: self.topic.clone(),
                rounds_target,
                participant1: TranscriptSide {
                    id: self.host.clone(),
                    arguments: table.ledgers[0].arguments().to_vec(),
                },
                participant2: TranscriptSide {
                    id: table.challenger.clone(),
                    arguments: table.ledgers[1].arguments().to_vec(),
                },
            })
        } else {
            SubmitOutcome::InProgress {
                current_round: round,
                next_turn: match seat.other() {
                    Seat::First => self.host.clone(),
                    Seat::Second => table.challenger.clone(),
                },
            }
        };

        if matches!(outcome, SubmitOutcome::Completed(_)) {
            self.phase = match self.take_phase() {
                Phase::InProgress { table, .. } => Phase::Completed { table },
                other => other,
            };
            info!(room_key = %self.key, rounds = rounds_target, "Final round recorded, debate closed");
        }

        assert_room_invariants(self);
        Ok(outcome)
    }

    /// Snapshot without a result attached
    pub fn snapshot(&self) -> RoomSnapshot {
        let arguments = match &self.phase {
            Phase::Waiting { host_ledger } => vec![LedgerView {
                participant: self.host.clone(),
                arguments: host_ledger.arguments().to_vec(),
            }],
            Phase::InProgress { table, .. } | Phase::Completed { table } => vec![
                LedgerView {
                    participant: self.host.clone(),
                    arguments: table.ledgers[0].arguments().to_vec(),
                },
                LedgerView {
                    participant: table.challenger.clone(),
                    arguments: table.ledgers[1].arguments().to_vec(),
                },
            ],
        };

        RoomSnapshot {
            room_key: self.key.clone(),
            topic: self.topic.clone(),
            status: self.status(),
            rounds_target: self.rules.rounds_target,
            participant1: self.host.clone(),
            participant2: self.challenger().cloned(),
            current_turn: self.current_turn().cloned(),
            arguments,
            created_at: self.created_at,
            result: None,
        }
    }

    /// Move the phase out for a by-value transition. The placeholder never escapes.
    fn take_phase(&mut self) -> Phase {
        std::mem::replace(
            &mut self.phase,
            Phase::Waiting {
                host_ledger: TurnLedger::new(),
            },
        )
    }
}

fn validate_argument(argument: String, max_chars: usize) -> Result<String> {
    let trimmed = argument.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation("argument must not be empty".into()));
    }
    let chars = trimmed.chars().count();
    if chars > max_chars {
        return Err(Error::Validation(format!(
            "argument is {} characters (max {})",
            chars, max_chars
        )));
    }
    Ok(trimmed.to_string())
}

/// A room behind its own lock, plus the result once scoring has finished
#[derive(Debug)]
pub struct SharedRoom {
    room: Mutex<Room>,
    record: OnceLock<Arc<DebateRecord>>,
}

impl SharedRoom {
    pub fn new(room: Room) -> Self {
        Self {
            room: Mutex::new(room),
            record: OnceLock::new(),
        }
    }

    pub fn join(&self, challenger: ParticipantId) -> Result<RoomSnapshot> {
        let mut room = self.lock();
        room.join(challenger)?;
        Ok(room.snapshot())
    }

    pub fn submit(&self, participant: &ParticipantId, argument: String) -> Result<SubmitOutcome> {
        self.lock().submit(participant, argument)
    }

    pub fn status(&self) -> RoomStatus {
        self.lock().status()
    }

    pub fn topic(&self) -> String {
        self.lock().topic().to_string()
    }

    pub fn snapshot(&self) -> RoomSnapshot {
        let mut snapshot = self.lock().snapshot();
        snapshot.result = self.record().map(|r| (*r).clone());
        snapshot
    }

    /// Attach the final record. Only the first call has any effect.
    pub fn publish(&self, record: DebateRecord) -> Arc<DebateRecord> {
        self.record.get_or_init(|| Arc::new(record)).clone()
    }

    pub fn record(&self) -> Option<Arc<DebateRecord>> {
        self.record.get().cloned()
    }

    // A panic inside a critical section cannot leave a half-applied transition:
    // every mutation happens after all checks have passed.
    fn lock(&self) -> MutexGuard<'_, Room> {
        self.room.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
