//! Server discovery, liveness, and spawn
//!
//! Per share invocation: read the recorded port, probe it, and if nothing
//! answers start a fresh server process and wait (bounded) for it to come
//! up. One recovery attempt; if the server still does not answer, the
//! share aborts. The stale-record case is expected - a server that died
//! uncleanly leaves its record behind - and the probe is what detects it.

use std::fs::OpenOptions;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::state::AppState;

/// How long a single connectivity probe may take
const PROBE_TIMEOUT: Duration = Duration::from_secs(1);
/// Total time a freshly spawned server gets to start answering
const SPAWN_DEADLINE: Duration = Duration::from_secs(3);
/// Interval between readiness probes after a spawn
const SPAWN_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, thiserror::Error)]
pub enum LocatorError {
    #[error("unable to resolve server executable: {0}")]
    Executable(std::io::Error),
    #[error("unable to open server log sink: {0}")]
    LogSink(std::io::Error),
    #[error("unable to start server process: {0}")]
    Spawn(std::io::Error),
    #[error("server unreachable on port {0} after recovery attempt")]
    Unreachable(u16),
}

/// Seam for starting a server process, so tests can stand in a fake.
pub trait ServerSpawner: Send + Sync {
    /// Start a detached server with output redirected to `log_path`.
    fn spawn(&self, log_path: &Path) -> Result<(), LocatorError>;
}

/// Spawns this executable's `daemon` subcommand as a detached child.
pub struct ExecSpawner;

impl ServerSpawner for ExecSpawner {
    fn spawn(&self, log_path: &Path) -> Result<(), LocatorError> {
        let exe = std::env::current_exe().map_err(LocatorError::Executable)?;
        let log = OpenOptions::new()
            .append(true)
            .create(true)
            .open(log_path)
            .map_err(LocatorError::LogSink)?;
        let err_log = log.try_clone().map_err(LocatorError::LogSink)?;

        tracing::info!(exe = ?exe, "starting server process");
        Command::new(exe)
            .arg("daemon")
            .stdin(Stdio::null())
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(err_log))
            .spawn()
            .map_err(LocatorError::Spawn)?;

        Ok(())
    }
}

/// TCP dial deciding whether anything listens on `port` locally.
pub async fn probe(port: u16) -> bool {
    matches!(
        timeout(PROBE_TIMEOUT, TcpStream::connect(("127.0.0.1", port))).await,
        Ok(Ok(_))
    )
}

/// Make sure a server is reachable, spawning one if needed.
///
/// Returns the port a live server answers on. A spawned server is assumed
/// to bind the configured default port; readiness is polled up to a short
/// deadline rather than guessed with a fixed sleep.
pub async fn ensure_server(
    state: &AppState,
    spawner: &dyn ServerSpawner,
) -> Result<u16, LocatorError> {
    match state.read_port() {
        Ok(port) => {
            if probe(port).await {
                tracing::debug!(port, "server reachable on recorded port");
                return Ok(port);
            }
            tracing::info!(port, "recorded server port is stale, respawning");
        }
        Err(_) => {
            tracing::info!("no server port recorded, spawning");
        }
    }

    spawner.spawn(&state.log_path)?;

    let port = state.config.port;
    let deadline = tokio::time::Instant::now() + SPAWN_DEADLINE;
    while tokio::time::Instant::now() < deadline {
        if probe(port).await {
            tracing::debug!(port, "spawned server is up");
            return Ok(port);
        }
        tokio::time::sleep(SPAWN_POLL_INTERVAL).await;
    }

    Err(LocatorError::Unreachable(port))
}
