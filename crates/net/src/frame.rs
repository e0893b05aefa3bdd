//! Length-prefixed frame encoding/decoding
//!
//! Wire format: [4-byte big-endian length][JSON payload]
//! Maximum frame size: 1MB (sanity limit)

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Error, Result};

/// Maximum allowed frame size (1MB)
pub const MAX_FRAME_SIZE: u32 = 1024 * 1024;

fn closed_or_io(e: std::io::Error) -> Error {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        Error::ConnectionClosed
    } else {
        Error::Io(e)
    }
}

/// Read a length-prefixed frame and decode its JSON payload
pub async fn read_frame<T, R>(reader: &mut R) -> Result<T>
where
    T: DeserializeOwned,
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf).await.map_err(closed_or_io)?;

    let len = u32::from_be_bytes(len_buf);
    if len == 0 {
        return Err(Error::Protocol("Empty frame".into()));
    }
    if len > MAX_FRAME_SIZE {
        return Err(Error::Protocol(format!(
            "Frame too large: {} bytes (max {})",
            len, MAX_FRAME_SIZE
        )));
    }

    let mut payload = vec![0u8; len as usize];
    reader.read_exact(&mut payload).await.map_err(closed_or_io)?;

    serde_json::from_slice(&payload).map_err(|e| Error::Decode(e.to_string()))
}

/// Encode a message as JSON and write it as one frame
pub async fn write_frame<T, W>(writer: &mut W, msg: &T) -> Result<()>
where
    T: Serialize,
    W: AsyncWrite + Unpin,
{
    let payload = serde_json::to_vec(msg)
        .map_err(|e| Error::Protocol(format!("Serialization failed: {}", e)))?;

    let len = u32::try_from(payload.len())
        .ok()
        .filter(|len| *len <= MAX_FRAME_SIZE)
        .ok_or_else(|| {
            Error::Protocol(format!(
                "Message too large: {} bytes (max {})",
                payload.len(),
                MAX_FRAME_SIZE
            ))
        })?;

    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(&payload).await?;
    writer.flush().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Request;
    use std::io::Cursor;

    #[tokio::test]
    async fn test_frame_carries_request() {
        let mut buf = Vec::new();
        write_frame(&mut buf, &Request::Ping).await.unwrap();
        assert_eq!(&buf[..4], &((buf.len() - 4) as u32).to_be_bytes());

        let mut cursor = Cursor::new(buf);
        let decoded: Request = read_frame(&mut cursor).await.unwrap();
        assert_eq!(decoded, Request::Ping);
    }

    #[tokio::test]
    async fn test_empty_frame_rejected() {
        let mut cursor = Cursor::new(vec![0, 0, 0, 0]);
        let result: Result<Request> = read_frame(&mut cursor).await;
        assert!(matches!(result, Err(Error::Protocol(_))));
    }

    #[tokio::test]
    async fn test_oversized_frame_rejected() {
        let len = (MAX_FRAME_SIZE + 1).to_be_bytes();
        let mut cursor = Cursor::new(len.to_vec());
        let result: Result<Request> = read_frame(&mut cursor).await;
        assert!(matches!(result, Err(Error::Protocol(_))));
    }

    #[tokio::test]
    async fn test_bad_json_is_decode_error() {
        let payload = b"{\"type\":\"launch_rockets\"}";
        let mut buf = (payload.len() as u32).to_be_bytes().to_vec();
        buf.extend_from_slice(payload);
        let result: Result<Request> = read_frame(&mut Cursor::new(buf)).await;
        assert!(matches!(result, Err(Error::Decode(_))));
    }

    #[tokio::test]
    async fn test_truncated_stream_is_closed() {
        let mut cursor = Cursor::new(vec![0, 0, 0, 9, b'{']);
        let result: Result<Request> = read_frame(&mut cursor).await;
        assert!(matches!(result, Err(Error::ConnectionClosed)));
    }
}
