//! Agora Network Library
//!
//! Exposes the debate service over TCP.
//!
//! # Architecture
//!
//! - **Server**: accepts connections and answers requests against a `DebateService`
//! - **Client**: one request/response connection to a server
//! - **Protocol**: length-prefixed JSON messages
//!
//! # Usage
//!
//! ```ignore
//! let server = Server::start(addr, service).await?;
//!
//! let mut client = Client::connect(server.addr()).await?;
//! let ticket = client.create_room("alice", None, Some(Genre::Music), None).await?;
//! client.join_room(ticket.room_key.as_str(), "bob").await?;
//! ```

pub mod client;
pub mod error;
mod frame;
pub mod invite;
pub mod protocol;
pub mod server;

pub use client::{Client, RoomTicket, SubmitReply};
pub use error::{Error, Result};
pub use frame::MAX_FRAME_SIZE;
pub use invite::InviteUrl;
pub use protocol::{Request, Response};
pub use server::Server;

/// Default port for Agora servers
pub const DEFAULT_PORT: u16 = 7420;
