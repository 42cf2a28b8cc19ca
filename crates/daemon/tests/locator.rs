//! Liveness state machine tests: recorded-port probe, conditional spawn,
//! bounded settle. A fake spawner stands in for the real process launch.

use std::net::TcpListener;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use tempfile::TempDir;

use airlift_daemon::locator::{self, LocatorError, ServerSpawner};
use airlift_daemon::state::AppState;

/// Records whether a spawn happened; the "server" it stands for is a
/// listener the test binds (or deliberately does not bind) itself.
#[derive(Default)]
struct FlagSpawner {
    spawned: AtomicBool,
}

impl FlagSpawner {
    fn was_spawned(&self) -> bool {
        self.spawned.load(Ordering::SeqCst)
    }
}

impl ServerSpawner for FlagSpawner {
    fn spawn(&self, _log_path: &Path) -> Result<(), LocatorError> {
        self.spawned.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// App state in a temp dir whose configured default port is `port`
fn state_with_default_port(temp: &TempDir, port: u16) -> AppState {
    std::fs::write(
        temp.path().join("config.toml"),
        format!("port = {}\n", port),
    )
    .unwrap();
    AppState::load(Some(temp.path().to_path_buf())).unwrap()
}

/// A port nothing listens on anymore
fn dead_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

#[tokio::test]
async fn test_reachable_record_skips_spawn() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let temp = TempDir::new().unwrap();
    let state = AppState::load(Some(temp.path().to_path_buf())).unwrap();
    state.write_port(port).unwrap();

    let spawner = FlagSpawner::default();
    let got = locator::ensure_server(&state, &spawner).await.unwrap();

    assert_eq!(got, port);
    assert!(!spawner.was_spawned());
}

#[tokio::test]
async fn test_no_record_spawns_then_probes_default_port() {
    // the "spawned server" is a listener already bound on the default port
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let temp = TempDir::new().unwrap();
    let state = state_with_default_port(&temp, port);
    assert!(state.read_port().is_err());

    let spawner = FlagSpawner::default();
    let got = locator::ensure_server(&state, &spawner).await.unwrap();

    assert_eq!(got, port);
    assert!(spawner.was_spawned());
}

#[tokio::test]
async fn test_stale_record_spawns_then_probes_default_port() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let live_port = listener.local_addr().unwrap().port();

    let temp = TempDir::new().unwrap();
    let state = state_with_default_port(&temp, live_port);
    // record points at a server that died
    state.write_port(dead_port()).unwrap();

    let spawner = FlagSpawner::default();
    let got = locator::ensure_server(&state, &spawner).await.unwrap();

    assert_eq!(got, live_port);
    assert!(spawner.was_spawned());
}

#[tokio::test]
async fn test_unreachable_after_recovery_is_fatal() {
    let temp = TempDir::new().unwrap();
    // nothing will ever listen on the configured port
    let state = state_with_default_port(&temp, dead_port());

    let spawner = FlagSpawner::default();
    let result = locator::ensure_server(&state, &spawner).await;

    assert!(spawner.was_spawned());
    assert!(matches!(result, Err(LocatorError::Unreachable(_))));
}

#[tokio::test]
async fn test_garbage_port_record_is_treated_as_no_server() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let temp = TempDir::new().unwrap();
    let state = state_with_default_port(&temp, port);
    std::fs::write(&state.port_path, "not-a-port").unwrap();

    let spawner = FlagSpawner::default();
    let got = locator::ensure_server(&state, &spawner).await.unwrap();

    assert_eq!(got, port);
    assert!(spawner.was_spawned());
}
