//! Server side of the share handoff
//!
//! Accept loop on the unix socket: one task per connection, each carrying
//! exactly one share payload that lands in the vault. A malformed payload
//! drops that connection and nothing else; the loop keeps serving.

use std::path::PathBuf;

use tokio::net::{UnixListener, UnixStream};
use tokio::sync::watch;

use common::crypto::Secret;
use common::ipc;

use crate::vault::Record;
use crate::ServiceState;

pub async fn run(
    socket_path: PathBuf,
    state: ServiceState,
    mut shutdown_rx: watch::Receiver<()>,
) -> Result<(), IpcServerError> {
    // a previous server instance may have left its socket file behind
    match std::fs::remove_file(&socket_path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(IpcServerError::Bind(e)),
    }

    let listener = UnixListener::bind(&socket_path).map_err(IpcServerError::Bind)?;
    tracing::info!(path = ?socket_path, "IPC listener bound");

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, _)) => {
                        let state = state.clone();
                        tokio::spawn(async move {
                            handle_connection(stream, state).await;
                        });
                    }
                    Err(e) => tracing::warn!("IPC accept failed: {}", e),
                }
            }
            _ = shutdown_rx.changed() => break,
        }
    }

    Ok(())
}

async fn handle_connection(mut stream: UnixStream, state: ServiceState) {
    let payload = match ipc::read_payload(&mut stream).await {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!("dropping unreadable share payload: {}", e);
            return;
        }
    };

    let secret = match Secret::from_base64(&payload.file_auth.secret) {
        Ok(secret) => secret,
        Err(e) => {
            tracing::warn!(path = ?payload.file_path, "dropping share with bad secret encoding: {}", e);
            return;
        }
    };

    tracing::info!(path = ?payload.file_path, "registered share");
    state.vault().insert(
        payload.file_path,
        Record {
            secret,
            otp: payload.file_auth.otp,
        },
    );
}

#[derive(Debug, thiserror::Error)]
pub enum IpcServerError {
    #[error("unable to bind IPC socket: {0}")]
    Bind(std::io::Error),
}
