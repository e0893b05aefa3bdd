//! TCP client for a debate server

use std::net::SocketAddr;

use agora_core::room::RoomSnapshot;
use agora_core::{DebateRecord, Genre, ParticipantId, Player, RoomKey};
use tokio::io::{ReadHalf, WriteHalf};
use tokio::net::TcpStream;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::frame::{read_frame, write_frame};
use crate::protocol::{Request, Response};

/// A room as returned by `create_room`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomTicket {
    pub room_key: RoomKey,
    pub topic: String,
    pub invite: String,
}

/// Outcome of a submitted argument
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitReply {
    Accepted {
        current_round: u32,
        next_turn: ParticipantId,
    },
    Completed(DebateRecord),
}

/// Request/response connection to a server
pub struct Client {
    reader: ReadHalf<TcpStream>,
    writer: WriteHalf<TcpStream>,
}

fn unexpected(response: Response) -> Error {
    Error::Protocol(format!("Unexpected response: {:?}", response))
}

impl Client {
    pub async fn connect(addr: SocketAddr) -> Result<Self> {
        info!(addr = %addr, "Connecting to server");
        let stream = TcpStream::connect(addr).await?;
        let (reader, writer) = tokio::io::split(stream);
        Ok(Self { reader, writer })
    }

    /// Send a request and wait for its response. Error responses become [`Error::Server`].
    pub async fn request(&mut self, request: &Request) -> Result<Response> {
        write_frame(&mut self.writer, request).await?;
        match read_frame(&mut self.reader).await? {
            Response::Error { code, message } => {
                debug!(?code, %message, "Request rejected by server");
                Err(Error::Server { code, message })
            }
            response => Ok(response),
        }
    }

    pub async fn ping(&mut self) -> Result<()> {
        match self.request(&Request::Ping).await? {
            Response::Pong => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    pub async fn create_player(&mut self, username: &str) -> Result<Player> {
        let request = Request::CreatePlayer {
            username: username.to_string(),
        };
        match self.request(&request).await? {
            Response::Player { player } => Ok(player),
            other => Err(unexpected(other)),
        }
    }

    pub async fn get_player(&mut self, username: &str) -> Result<Player> {
        let request = Request::GetPlayer {
            username: username.to_string(),
        };
        match self.request(&request).await? {
            Response::Player { player } => Ok(player),
            other => Err(unexpected(other)),
        }
    }

    pub async fn leaderboard(&mut self, limit: u32) -> Result<Vec<Player>> {
        match self.request(&Request::Leaderboard { limit }).await? {
            Response::Players { players } => Ok(players),
            other => Err(unexpected(other)),
        }
    }

    pub async fn genres(&mut self) -> Result<Vec<Genre>> {
        match self.request(&Request::ListGenres).await? {
            Response::Genres { genres } => Ok(genres),
            other => Err(unexpected(other)),
        }
    }

    pub async fn topics(&mut self, genre: Genre) -> Result<Vec<String>> {
        match self.request(&Request::Topics { genre }).await? {
            Response::Topics { topics, .. } => Ok(topics),
            other => Err(unexpected(other)),
        }
    }

    pub async fn create_room(
        &mut self,
        participant: &str,
        topic: Option<&str>,
        genre: Option<Genre>,
        rounds: Option<u32>,
    ) -> Result<RoomTicket> {
        let request = Request::CreateRoom {
            participant: ParticipantId::new(participant),
            topic: topic.map(str::to_string),
            genre,
            rounds,
        };
        match self.request(&request).await? {
            Response::RoomCreated {
                room_key,
                topic,
                invite,
            } => Ok(RoomTicket {
                room_key,
                topic,
                invite,
            }),
            other => Err(unexpected(other)),
        }
    }

    pub async fn join_room(&mut self, room_key: &str, participant: &str) -> Result<RoomSnapshot> {
        let request = Request::JoinRoom {
            room_key: room_key.to_string(),
            participant: ParticipantId::new(participant),
        };
        match self.request(&request).await? {
            Response::Room { room } => Ok(room),
            other => Err(unexpected(other)),
        }
    }

    pub async fn submit_argument(
        &mut self,
        room_key: &str,
        participant: &str,
        argument: &str,
    ) -> Result<SubmitReply> {
        let request = Request::SubmitArgument {
            room_key: room_key.to_string(),
            participant: ParticipantId::new(participant),
            argument: argument.to_string(),
        };
        match self.request(&request).await? {
            Response::ArgumentAccepted {
                current_round,
                next_turn,
            } => Ok(SubmitReply::Accepted {
                current_round,
                next_turn,
            }),
            Response::DebateCompleted { record } => Ok(SubmitReply::Completed(record)),
            other => Err(unexpected(other)),
        }
    }

    pub async fn room_status(&mut self, room_key: &str) -> Result<RoomSnapshot> {
        let request = Request::RoomStatus {
            room_key: room_key.to_string(),
        };
        match self.request(&request).await? {
            Response::Room { room } => Ok(room),
            other => Err(unexpected(other)),
        }
    }

    pub async fn debate_history(&mut self, room_key: &str) -> Result<DebateRecord> {
        let request = Request::DebateHistory {
            room_key: room_key.to_string(),
        };
        match self.request(&request).await? {
            Response::Debate { record } => Ok(record),
            other => Err(unexpected(other)),
        }
    }
}
