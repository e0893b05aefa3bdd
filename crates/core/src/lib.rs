//! Agora Core Library
//!
//! Debate rooms, turn ledgers, scoring, player profiles and archives for the
//! Agora debate server.

pub mod archive;
pub mod assembler;
pub mod config;
pub mod error;
pub mod invariants;
pub mod ledger;
pub mod models;
pub mod registry;
pub mod room;
pub mod scoring;
pub mod service;
pub mod storage;
pub mod topics;

pub use archive::{DebateArchive, FileArchive, MemoryArchive};
pub use config::AgoraConfig;
pub use error::{Error, ErrorCode, ErrorKind, Result};
pub use models::*;
pub use registry::RoomRegistry;
pub use room::{RoomRules, RoomSnapshot, RoomStatus, SharedRoom, SubmitOutcome};
pub use scoring::{OpenRouterOracle, OracleError, ScoringOracle, ScoringOrchestrator};
pub use service::{Collaborators, CreatedRoom, DebateService, SubmitResult};
pub use storage::{Database, PlayerDirectory, SharedDatabase};
pub use topics::{Genre, TopicBank, TopicSource};
