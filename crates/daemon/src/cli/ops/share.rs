use std::path::PathBuf;

use clap::Args;

use airlift_daemon::link;
use airlift_daemon::locator::{self, ExecSpawner, LocatorError};
use airlift_daemon::state::{AppState, StateError};
use common::crypto::{Secret, SecretError};
use common::ipc::{self, FileAuth, IpcError, SharePayload};
use common::token::{self, TokenError};

#[derive(Args, Debug, Clone)]
pub struct Share {
    /// Absolute path of the file to share
    #[arg(value_name = "FILE")]
    pub path: PathBuf,

    /// One-time password stored alongside the share
    #[arg(long, default_value = "")]
    pub otp: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ShareError {
    #[error("an absolute path is required, got: {0}")]
    RelativePath(PathBuf),
    #[error("not a shareable file: {0}")]
    NotAFile(PathBuf),
    #[error("unable to read file: {0}")]
    Io(#[from] std::io::Error),
    #[error("no LAN address detected")]
    NoLan,
    #[error("state error: {0}")]
    State(#[from] StateError),
    #[error(transparent)]
    Locator(#[from] LocatorError),
    #[error("unable to generate share secret: {0}")]
    Secret(#[from] SecretError),
    #[error("unable to hand the share to the server: {0}")]
    Ipc(#[from] IpcError),
    #[error("unable to sign share token: {0}")]
    Token(#[from] TokenError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Share {
    type Error = ShareError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        // Validate the target before anything else; no link may exist for
        // a path the server could never serve.
        if !self.path.is_absolute() {
            return Err(ShareError::RelativePath(self.path.clone()));
        }
        let meta = match std::fs::metadata(&self.path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ShareError::NotAFile(self.path.clone()))
            }
            Err(e) => return Err(ShareError::Io(e)),
        };
        if !meta.is_file() {
            return Err(ShareError::NotAFile(self.path.clone()));
        }

        let ip = link::local_ip().ok_or(ShareError::NoLan)?;

        let state = AppState::load(ctx.config_path.clone())?;
        let port = locator::ensure_server(&state, &ExecSpawner).await?;

        // Fresh secret per share; re-sharing the same path supersedes any
        // earlier secret and its tokens.
        let secret = Secret::generate()?;

        ipc::send(
            &state.socket_path,
            &SharePayload {
                file_auth: FileAuth {
                    secret: secret.to_base64(),
                    otp: self.otp.clone(),
                },
                file_path: self.path.clone(),
            },
        )
        .await?;

        let token = token::issue(&self.path, &secret)?;
        let url = link::share_link(ip, port, &token);

        let name = self
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("file");

        Ok(format!(
            "Sharing {} ({} bytes)\nLink: {}",
            name,
            meta.len(),
            url
        ))
    }
}
