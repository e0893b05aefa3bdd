//! Debate service - the surface exposed to front ends
//!
//! Wires the room registry to the scoring pipeline and to the best-effort
//! collaborators (player directory, archive, topic source). Room operations
//! only ever hold one room's lock, and never across an await.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

use crate::archive::DebateArchive;
use crate::assembler::assemble;
use crate::config::{AgoraConfig, DebateConfig};
use crate::error::{Error, Result};
use crate::models::{DebateRecord, Outcome, ParticipantId, Player, RoomKey};
use crate::registry::RoomRegistry;
use crate::room::{DebateTranscript, RoomSnapshot, RoomStatus, SharedRoom, SubmitOutcome};
use crate::scoring::{ScoringOracle, ScoringOrchestrator};
use crate::storage::PlayerDirectory;
use crate::topics::{Genre, TopicBank, TopicSource, TOPICS_PER_GENRE};

/// External collaborators of the service
pub struct Collaborators {
    pub oracle: Arc<dyn ScoringOracle>,
    pub topics: Arc<dyn TopicSource>,
    pub players: Arc<dyn PlayerDirectory>,
    pub archive: Arc<dyn DebateArchive>,
}

/// A freshly created room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedRoom {
    pub room_key: RoomKey,
    pub topic: String,
}

/// Result of an accepted argument
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitResult {
    InProgress {
        current_round: u32,
        next_turn: ParticipantId,
    },
    /// The debate is over and has been scored
    Completed(Arc<DebateRecord>),
}

/// Number of bookkeeping writes still running after their debate was returned
struct PendingWrites(watch::Sender<usize>);

struct PendingGuard(Arc<PendingWrites>);

impl Default for PendingWrites {
    fn default() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self(tx)
    }
}

impl PendingWrites {
    fn track(self: &Arc<Self>) -> PendingGuard {
        self.0.send_modify(|n| *n += 1);
        PendingGuard(Arc::clone(self))
    }

    async fn wait_idle(&self) {
        let mut rx = self.0.subscribe();
        // The sender lives in `self`, so the channel cannot close here
        let _ = rx.wait_for(|n| *n == 0).await;
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0 .0.send_modify(|n| *n -= 1);
    }
}

/// Scoring and bookkeeping for a completed room. Runs detached from the caller.
#[derive(Clone)]
struct Settlement {
    orchestrator: Arc<ScoringOrchestrator>,
    players: Arc<dyn PlayerDirectory>,
    archive: Arc<dyn DebateArchive>,
    pending: Arc<PendingWrites>,
}

impl Settlement {
    /// Score and publish the record. Standings and the archive write are
    /// left running in the background.
    async fn settle(self, room: Arc<SharedRoom>, transcript: DebateTranscript) -> Arc<DebateRecord> {
        let evaluation = self.orchestrator.evaluate(&transcript).await;
        let record = assemble(transcript.topic, transcript.room_key, evaluation, Utc::now());
        let record = room.publish(record);

        let guard = self.pending.track();
        let written = Arc::clone(&record);
        let Settlement { players, archive, .. } = self;
        tokio::spawn(async move {
            let key = written.archive_key();
            let task = tokio::task::spawn_blocking(move || {
                let _guard = guard;
                record_standings(players.as_ref(), &written);
                archive_record(archive.as_ref(), &written);
            });
            if let Err(e) = task.await {
                error!(key = %key, error = %e, "Result bookkeeping task failed");
            }
        });

        record
    }
}

fn record_standings(players: &dyn PlayerDirectory, record: &DebateRecord) {
    let result = match (&record.outcome, record.loser()) {
        (Outcome::Winner(winner), Some(loser)) => {
            players.record_result(winner.as_str(), loser.as_str(), record.rating_delta())
        }
        _ => players.record_draw(
            record.participant1.id.as_str(),
            record.participant2.id.as_str(),
        ),
    };
    match result {
        Ok(()) => debug!(outcome = %record.outcome, "Standings updated"),
        Err(Error::PlayerNotFound(name)) => {
            debug!(player = %name, "Unregistered participant, standings unchanged")
        }
        Err(e) => error!(error = %e, "Failed to record debate result"),
    }
}

fn archive_record(archive: &dyn DebateArchive, record: &DebateRecord) {
    let key = record.archive_key();
    if let Err(e) = archive.persist(record, &key) {
        error!(key = %key, error = %e, "Failed to archive debate");
    }
}

pub struct DebateService {
    registry: RoomRegistry,
    settlement: Settlement,
    topics: Arc<dyn TopicSource>,
    debate: DebateConfig,
    topic_timeout: Duration,
}

impl DebateService {
    pub fn new(config: &AgoraConfig, parts: Collaborators) -> Self {
        let orchestrator =
            ScoringOrchestrator::new(parts.oracle).with_timeout(config.oracle.timeout());
        Self {
            registry: RoomRegistry::new(config.debate.room_key_length),
            settlement: Settlement {
                orchestrator: Arc::new(orchestrator),
                players: parts.players,
                archive: parts.archive,
                pending: Arc::default(),
            },
            topics: parts.topics,
            debate: config.debate.clone(),
            topic_timeout: config.oracle.timeout(),
        }
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    // ----- players -----

    pub fn create_player(&self, username: &str) -> Result<Player> {
        self.settlement.players.create_player(username)
    }

    pub fn get_player(&self, username: &str) -> Result<Player> {
        self.settlement
            .players
            .get_player(username)?
            .ok_or_else(|| Error::PlayerNotFound(username.trim().to_string()))
    }

    pub fn leaderboard(&self, limit: u32) -> Result<Vec<Player>> {
        self.settlement.players.leaderboard(limit)
    }

    /// The participant under their registered name. Unknown names are
    /// rejected when registration is required and passed through otherwise.
    fn resolve_participant(&self, participant: ParticipantId) -> Result<ParticipantId> {
        if participant.is_blank() {
            return Err(Error::Validation("participant is required".into()));
        }
        let players = &self.settlement.players;
        if !players.player_exists(participant.as_str())? {
            if self.debate.require_registered_players {
                return Err(Error::PlayerNotFound(participant.to_string()));
            }
            return Ok(participant);
        }
        Ok(match players.get_player(participant.as_str())? {
            Some(player) => ParticipantId::new(player.username),
            None => participant,
        })
    }

    // ----- topics -----

    pub fn genres(&self) -> &'static [Genre] {
        &Genre::ALL
    }

    /// Exactly three suggestions; the built-in bank covers for a failing source
    pub async fn topics_for_genre(&self, genre: Genre) -> Vec<String> {
        let result = tokio::time::timeout(self.topic_timeout, self.topics.topics_for_genre(genre)).await;
        match result {
            Ok(Ok(topics)) if topics.len() == TOPICS_PER_GENRE => topics,
            Ok(Ok(topics)) => {
                warn!(%genre, count = topics.len(), "Topic source returned wrong count, using topic bank");
                TopicBank::pick(&mut rand::thread_rng(), genre, TOPICS_PER_GENRE)
            }
            Ok(Err(e)) => {
                warn!(%genre, error = %e, "Topic source failed, using topic bank");
                TopicBank::pick(&mut rand::thread_rng(), genre, TOPICS_PER_GENRE)
            }
            Err(_) => {
                warn!(%genre, "Topic source timed out, using topic bank");
                TopicBank::pick(&mut rand::thread_rng(), genre, TOPICS_PER_GENRE)
            }
        }
    }

    async fn generate_topic(&self) -> String {
        match tokio::time::timeout(self.topic_timeout, self.topics.generate_topic()).await {
            Ok(Ok(topic)) if !topic.trim().is_empty() => topic,
            Ok(Ok(_)) => {
                warn!("Topic source returned an empty topic, using topic bank");
                TopicBank::any(&mut rand::thread_rng())
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Topic source failed, using topic bank");
                TopicBank::any(&mut rand::thread_rng())
            }
            Err(_) => {
                warn!("Topic source timed out, using topic bank");
                TopicBank::any(&mut rand::thread_rng())
            }
        }
    }

    // ----- rooms -----

    /// Open a room. An explicit topic wins over a genre; with neither, one is generated.
    #[instrument(skip_all, fields(participant = %participant, ?genre, ?rounds))]
    pub async fn create_room(
        &self,
        participant: ParticipantId,
        topic: Option<String>,
        genre: Option<Genre>,
        rounds: Option<u32>,
    ) -> Result<CreatedRoom> {
        let rules = self.debate.rules(rounds)?;
        let participant = self.resolve_participant(participant)?;

        let explicit = topic
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        let topic = match (explicit, genre) {
            (Some(topic), _) => topic,
            (None, Some(genre)) => {
                let mut options = self.topics_for_genre(genre).await;
                let pick = rand::thread_rng().gen_range(0..options.len());
                options.swap_remove(pick)
            }
            (None, None) => self.generate_topic().await,
        };

        let (room_key, _room) = self.registry.create(participant, topic.clone(), rules)?;
        Ok(CreatedRoom { room_key, topic })
    }

    #[instrument(skip_all, fields(room_key = %room_key, participant = %participant))]
    pub fn join_room(&self, room_key: &RoomKey, participant: ParticipantId) -> Result<RoomSnapshot> {
        let room = self.registry.get(room_key)?;
        // Seating is rechecked under the room lock; this only orders the errors
        if room.status() != RoomStatus::Waiting {
            return Err(Error::RoomFull(room_key.clone()));
        }
        let participant = self.resolve_participant(participant)?;
        room.join(participant)
    }

    /// Wait until every debate returned so far has been written to the player
    /// directory and the archive
    pub async fn flush_records(&self) {
        self.settlement.pending.wait_idle().await;
    }

    /// Record an argument. The completing submission waits for the verdict
    /// but not for the record to be stored.
    #[instrument(skip_all, fields(room_key = %room_key, participant = %participant))]
    pub async fn submit_argument(
        &self,
        room_key: &RoomKey,
        participant: &ParticipantId,
        argument: String,
    ) -> Result<SubmitResult> {
        let room = self.registry.get(room_key)?;

        match room.submit(participant, argument)? {
            SubmitOutcome::InProgress {
                current_round,
                next_turn,
            } => Ok(SubmitResult::InProgress {
                current_round,
                next_turn,
            }),
            SubmitOutcome::Completed(transcript) => {
                info!("Final argument received, scoring debate");
                // Detached so a caller that goes away cannot strand the room unscored
                let task = tokio::spawn(self.settlement.clone().settle(room, transcript));
                let record = task.await.map_err(|e| Error::Scoring(e.to_string()))?;
                Ok(SubmitResult::Completed(record))
            }
        }
    }

    pub fn room_status(&self, room_key: &RoomKey) -> Result<RoomSnapshot> {
        Ok(self.registry.get(room_key)?.snapshot())
    }

    /// Final record of a debate, from memory or from the archive
    pub fn debate_history(&self, room_key: &RoomKey) -> Result<DebateRecord> {
        if let Ok(room) = self.registry.get(room_key) {
            if let Some(record) = room.record() {
                return Ok((*record).clone());
            }
        }
        self.settlement
            .archive
            .load(&format!("debate_{}", room_key))?
            .ok_or_else(|| Error::RoomNotFound(room_key.clone()))
    }
}
