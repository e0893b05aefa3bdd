//! Network error types

use std::io;

use agora_core::ErrorCode;

/// Network result type
pub type Result<T> = std::result::Result<T, Error>;

/// Network errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Connection closed")]
    ConnectionClosed,

    /// Framing is broken; the stream cannot be trusted any more
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// A well-framed payload that is not a valid message
    #[error("Invalid message: {0}")]
    Decode(String),

    /// The server answered with an error response
    #[error("Server error ({code:?}): {message}")]
    Server { code: ErrorCode, message: String },
}

impl Error {
    /// Failure code if the server rejected the request
    pub fn server_code(&self) -> Option<ErrorCode> {
        match self {
            Error::Server { code, .. } => Some(*code),
            _ => None,
        }
    }
}
