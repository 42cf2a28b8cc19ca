//! Client -> server credential handoff
//!
//! The short-lived share client and the long-lived server are separate OS
//! processes; this module carries one share's credentials between them over
//! a unix domain socket bound under the app state directory.
//!
//! Protocol: one connection per share event. The client connects, writes a
//! single bincode-encoded [`SharePayload`], and shuts the stream down. No
//! acknowledgment is sent back; delivery is at-most-once and the client
//! treats any connect/write failure as fatal for the whole share.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;

/// Authorization material for one shared path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAuth {
    /// Base64-encoded share secret
    pub secret: String,
    /// One-time password supplied by the user, may be empty
    pub otp: String,
}

/// The record delivered over the socket, keyed server-side by `file_path`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharePayload {
    pub file_auth: FileAuth,
    pub file_path: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum IpcError {
    #[error("socket i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("payload encoding failed: {0}")]
    Codec(#[from] bincode::Error),
}

/// Send one payload to the server listening at `socket_path`.
pub async fn send(socket_path: &Path, payload: &SharePayload) -> Result<(), IpcError> {
    let mut stream = UnixStream::connect(socket_path).await?;
    let bytes = bincode::serialize(payload)?;
    stream.write_all(&bytes).await?;
    stream.shutdown().await?;
    Ok(())
}

/// Read the single payload carried by an accepted connection.
pub async fn read_payload(stream: &mut UnixStream) -> Result<SharePayload, IpcError> {
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await?;
    Ok(bincode::deserialize(&buf)?)
}
