//! Wire framing: 4-byte length prefix (big-endian) + JSON payload.
//!
//! Mirrors the teacher's IPC wire format exactly (same framing, same
//! length-prefix width); the payload shapes here are `dbg_core::protocol`'s
//! `Request`/`Reply`/`Notification` instead of the teacher's job-queue
//! messages.

use dbg_core::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Maximum accepted frame size. Guards against a corrupt length prefix
/// turning a read into an unbounded allocation.
pub const MAX_FRAME_LEN: u32 = 64 * 1024 * 1024;

/// Serializes `value` to JSON. Does not add the length prefix; callers that
/// write directly to a stream should use [`write_message`] instead.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| Error::FormatError(e.to_string()))
}

/// Deserializes a JSON payload (without its length prefix).
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| Error::FormatError(e.to_string()))
}

/// Writes `payload` prefixed with its big-endian `u32` length.
pub async fn write_message<W: AsyncWrite + Unpin>(writer: &mut W, payload: &[u8]) -> Result<()> {
    let len = u32::try_from(payload.len())
        .map_err(|_| Error::FormatError(format!("message too large: {} bytes", payload.len())))?;
    writer
        .write_all(&len.to_be_bytes())
        .await
        .map_err(|e| Error::Io(e.to_string()))?;
    writer
        .write_all(payload)
        .await
        .map_err(|e| Error::Io(e.to_string()))?;
    writer.flush().await.map_err(|e| Error::Io(e.to_string()))?;
    Ok(())
}

/// Reads one length-prefixed frame. Returns `Error::Io` on EOF or a short
/// read, `Error::FormatError` if the declared length exceeds
/// [`MAX_FRAME_LEN`].
pub async fn read_message<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>> {
    let mut len_buf = [0u8; 4];
    reader
        .read_exact(&mut len_buf)
        .await
        .map_err(|e| Error::Io(e.to_string()))?;
    let len = u32::from_be_bytes(len_buf);
    if len > MAX_FRAME_LEN {
        return Err(Error::FormatError(format!(
            "frame length {len} exceeds max {MAX_FRAME_LEN}"
        )));
    }
    let mut payload = vec![0u8; len as usize];
    reader
        .read_exact(&mut payload)
        .await
        .map_err(|e| Error::Io(e.to_string()))?;
    Ok(payload)
}

/// Writes a length-prefixed, JSON-encoded message in one call.
pub async fn write_json<W: AsyncWrite + Unpin, T: Serialize>(writer: &mut W, value: &T) -> Result<()> {
    let payload = encode(value)?;
    write_message(writer, &payload).await
}

/// Reads and decodes one length-prefixed, JSON-encoded message.
pub async fn read_json<R: AsyncRead + Unpin, T: DeserializeOwned>(reader: &mut R) -> Result<T> {
    let payload = read_message(reader).await?;
    decode(&payload)
}

#[cfg(test)]
#[path = "codec_tests.rs"]
mod tests;
