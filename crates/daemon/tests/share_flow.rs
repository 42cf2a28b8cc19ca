//! End-to-end share flow: locator spawn, IPC handoff, token issuance, and
//! an authorized download over a real TCP socket. The "spawned process" is
//! the same service stack started in-process by a fake spawner.

use std::fs;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::watch;

use airlift_daemon::locator::{self, LocatorError, ServerSpawner};
use airlift_daemon::state::AppState;
use airlift_daemon::{http_server, ipc_server, ServiceConfig, ServiceState};
use common::crypto::Secret;
use common::ipc::{self, FileAuth, SharePayload};
use common::token;

/// Starts the real HTTP router + IPC listener when the locator asks for a
/// server, standing in for the detached process launch.
struct ServiceSpawner {
    inner: Mutex<Option<SpawnParts>>,
}

struct SpawnParts {
    listener: tokio::net::TcpListener,
    config: ServiceConfig,
    state: ServiceState,
    shutdown_rx: watch::Receiver<()>,
}

impl ServerSpawner for ServiceSpawner {
    fn spawn(&self, _log_path: &Path) -> Result<(), LocatorError> {
        let SpawnParts {
            listener,
            config,
            state,
            shutdown_rx,
        } = self
            .inner
            .lock()
            .unwrap()
            .take()
            .expect("spawner invoked once");

        let router = http_server::router(&config, state.clone());
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        tokio::spawn(ipc_server::run(config.socket_path.clone(), state, shutdown_rx));

        Ok(())
    }
}

async fn wait_until<F: Fn() -> bool>(condition: F) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not met within deadline"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn test_share_then_download() {
    let temp = TempDir::new().unwrap();

    // the file to share: 10 bytes
    let file_path = temp.path().join("a.txt");
    fs::write(&file_path, b"0123456789").unwrap();

    // no pre-existing server: bind an ephemeral port and make it the
    // configured default so the locator's post-spawn probe finds it
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    fs::write(
        temp.path().join("config.toml"),
        format!("port = {}\n", port),
    )
    .unwrap();
    let app_state = AppState::load(Some(temp.path().to_path_buf())).unwrap();

    let service_state = ServiceState::new();
    let config = ServiceConfig {
        port,
        open_access: false,
        port_path: app_state.port_path.clone(),
        socket_path: app_state.socket_path.clone(),
        log_level: tracing::Level::INFO,
        log_dir: None,
    };
    let (_shutdown_tx, shutdown_rx) = watch::channel(());
    let spawner = ServiceSpawner {
        inner: Mutex::new(Some(SpawnParts {
            listener,
            config,
            state: service_state.clone(),
            shutdown_rx,
        })),
    };

    // locator: no record -> spawn -> probe
    let resolved = locator::ensure_server(&app_state, &spawner).await.unwrap();
    assert_eq!(resolved, port);

    // client side of the share: secret, IPC handoff, token
    let secret = Secret::generate().unwrap();
    wait_until(|| app_state.socket_path.exists()).await;
    ipc::send(
        &app_state.socket_path,
        &SharePayload {
            file_auth: FileAuth {
                secret: secret.to_base64(),
                otp: String::new(),
            },
            file_path: file_path.clone(),
        },
    )
    .await
    .unwrap();

    let shared_path = file_path.clone();
    wait_until(move || service_state.vault().get(&shared_path).is_some()).await;

    let tok = token::issue(&file_path, &secret).unwrap();
    assert_eq!(token::peek_path(&tok).unwrap(), file_path);

    // a nearby device fetches the link
    let base = format!("http://127.0.0.1:{}", resolved);
    let response = reqwest::get(format!("{}/?token={}", base, tok)).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(response.bytes().await.unwrap().to_vec(), b"0123456789");

    // resuming from byte 5
    let client = reqwest::Client::new();
    let response = client
        .get(format!("{}/?token={}", base, tok))
        .header("Range", "bytes=5-")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        response
            .headers()
            .get("Content-Range")
            .unwrap()
            .to_str()
            .unwrap(),
        "bytes 5-9/10"
    );
    assert_eq!(response.bytes().await.unwrap().to_vec(), b"56789");

    // a wrongly signed token gets nothing
    let forged = token::issue(&file_path, &Secret::generate().unwrap()).unwrap();
    let response = reqwest::get(format!("{}/?token={}", base, forged))
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);
}
