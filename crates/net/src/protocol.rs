//! Network protocol message types
//!
//! All messages are JSON-serialized and length-prefixed on the wire. Every
//! request gets exactly one response on the same connection.

use agora_core::room::RoomSnapshot;
use agora_core::{DebateRecord, Error as CoreError, ErrorCode, Genre, ParticipantId, Player, RoomKey};
use serde::{Deserialize, Serialize};

/// Client to server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    CreatePlayer {
        username: String,
    },
    GetPlayer {
        username: String,
    },
    Leaderboard {
        limit: u32,
    },
    ListGenres,
    Topics {
        genre: Genre,
    },
    /// Open a room. `topic` wins over `genre`; with neither a topic is generated.
    CreateRoom {
        participant: ParticipantId,
        #[serde(default)]
        topic: Option<String>,
        #[serde(default)]
        genre: Option<Genre>,
        #[serde(default)]
        rounds: Option<u32>,
    },
    JoinRoom {
        room_key: String,
        participant: ParticipantId,
    },
    SubmitArgument {
        room_key: String,
        participant: ParticipantId,
        argument: String,
    },
    RoomStatus {
        room_key: String,
    },
    DebateHistory {
        room_key: String,
    },
    Ping,
}

/// Server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    Player {
        player: Player,
    },
    Players {
        players: Vec<Player>,
    },
    Genres {
        genres: Vec<Genre>,
    },
    Topics {
        genre: Genre,
        topics: Vec<String>,
    },
    RoomCreated {
        room_key: RoomKey,
        topic: String,
        invite: String,
    },
    Room {
        room: RoomSnapshot,
    },
    ArgumentAccepted {
        current_round: u32,
        next_turn: ParticipantId,
    },
    /// The submission finished the debate; carries the verdict
    DebateCompleted {
        record: DebateRecord,
    },
    Debate {
        record: DebateRecord,
    },
    Pong,
    Error {
        code: ErrorCode,
        message: String,
    },
}

impl From<CoreError> for Response {
    fn from(e: CoreError) -> Self {
        Response::Error {
            code: e.code(),
            message: e.to_string(),
        }
    }
}
