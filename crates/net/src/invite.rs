//! Invite URL generation and parsing
//!
//! Invite format: agora://<host>:<port>/<ROOM KEY>

use std::fmt;
use std::net::{IpAddr, SocketAddr};

use agora_core::RoomKey;

use crate::error::{Error, Result};

const SCHEME: &str = "agora://";

/// A shareable pointer to a room on a server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InviteUrl {
    pub host: IpAddr,
    pub port: u16,
    pub room_key: RoomKey,
}

impl InviteUrl {
    pub fn new(host: IpAddr, port: u16, room_key: RoomKey) -> Self {
        Self {
            host,
            port,
            room_key,
        }
    }

    pub fn from_addr(addr: SocketAddr, room_key: RoomKey) -> Self {
        Self::new(addr.ip(), addr.port(), room_key)
    }

    /// Get the socket address for connection
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn to_url(&self) -> String {
        format!("{}{}/{}", SCHEME, self.socket_addr(), self.room_key)
    }

    pub fn parse(s: &str) -> Result<Self> {
        let rest = s
            .trim()
            .strip_prefix(SCHEME)
            .ok_or_else(|| Error::Protocol(format!("Invalid invite URL: missing {} prefix", SCHEME)))?;

        let (host_port, key) = rest
            .split_once('/')
            .ok_or_else(|| Error::Protocol("Invalid invite URL: expected host:port/ROOMKEY".into()))?;

        let addr: SocketAddr = host_port.parse().map_err(|_| {
            Error::Protocol(format!("Invalid invite URL: bad address '{}'", host_port))
        })?;

        let room_key = RoomKey::parse(key.trim_end_matches('/'))
            .ok_or_else(|| Error::Protocol(format!("Invalid invite URL: bad room key '{}'", key)))?;

        Ok(Self::from_addr(addr, room_key))
    }
}

impl fmt::Display for InviteUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_url())
    }
}
