//! Error types for Agora Core

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{ParticipantId, RoomKey};

#[derive(Error, Debug)]
pub enum Error {
    #[error("Room not found: {0}")]
    RoomNotFound(RoomKey),

    #[error("Room {0} is full")]
    RoomFull(RoomKey),

    #[error("Not your turn: waiting for {expected}, got {actual}")]
    NotYourTurn {
        expected: ParticipantId,
        actual: ParticipantId,
    },

    #[error("Debate in room {0} is not in progress")]
    RoomNotInProgress(RoomKey),

    #[error("Debate in room {0} has already completed")]
    RoomAlreadyCompleted(RoomKey),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Player not found: {0}")]
    PlayerNotFound(String),

    #[error("Player already exists: {0}")]
    PlayerExists(String),

    #[error("Could not allocate a unique room key after {0} attempts")]
    KeySpaceExhausted(u32),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Scoring task failed: {0}")]
    Scoring(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Broad failure class a caller uses to decide how to react
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input, state unchanged
    Validation,
    /// Legal input at the wrong moment, state unchanged
    StateConflict,
    /// Referenced room or player does not exist
    NotFound,
    /// Storage, configuration or runtime failure
    Internal,
}

/// Stable failure code carried over the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    NotFound,
    RoomFull,
    NotYourTurn,
    NotInProgress,
    AlreadyCompleted,
    Validation,
    PlayerNotFound,
    PlayerExists,
    Internal,
}

impl Error {
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::RoomNotFound(_) => ErrorCode::NotFound,
            Error::RoomFull(_) => ErrorCode::RoomFull,
            Error::NotYourTurn { .. } => ErrorCode::NotYourTurn,
            Error::RoomNotInProgress(_) => ErrorCode::NotInProgress,
            Error::RoomAlreadyCompleted(_) => ErrorCode::AlreadyCompleted,
            Error::Validation(_) => ErrorCode::Validation,
            Error::PlayerNotFound(_) => ErrorCode::PlayerNotFound,
            Error::PlayerExists(_) => ErrorCode::PlayerExists,
            Error::KeySpaceExhausted(_)
            | Error::Config(_)
            | Error::Database(_)
            | Error::Io(_)
            | Error::Serialization(_)
            | Error::ConfigParse(_)
            | Error::Scoring(_) => ErrorCode::Internal,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self.code() {
            ErrorCode::Validation | ErrorCode::PlayerExists => ErrorKind::Validation,
            ErrorCode::RoomFull
            | ErrorCode::NotYourTurn
            | ErrorCode::NotInProgress
            | ErrorCode::AlreadyCompleted => ErrorKind::StateConflict,
            ErrorCode::NotFound | ErrorCode::PlayerNotFound => ErrorKind::NotFound,
            ErrorCode::Internal => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_conflicts_are_classified() {
        let key = RoomKey::new("ABC123");
        let err = Error::NotYourTurn {
            expected: ParticipantId::new("alice"),
            actual: ParticipantId::new("bob"),
        };
        assert_eq!(err.code(), ErrorCode::NotYourTurn);
        assert_eq!(err.kind(), ErrorKind::StateConflict);
        assert_eq!(Error::RoomFull(key.clone()).kind(), ErrorKind::StateConflict);
        assert_eq!(Error::RoomNotFound(key).kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_error_code_wire_names() {
        let json = serde_json::to_string(&ErrorCode::AlreadyCompleted).unwrap();
        assert_eq!(json, "\"already_completed\"");
    }
}
