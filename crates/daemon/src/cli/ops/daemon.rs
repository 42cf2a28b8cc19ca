use clap::Args;

use airlift_daemon::state::AppState;
use airlift_daemon::{spawn_service, ServiceConfig};

#[derive(Args, Debug, Clone)]
pub struct Daemon {
    /// Override the listen port (default from config)
    #[arg(long)]
    pub port: Option<u16>,

    /// Serve `?path=` requests without a capability token
    #[arg(long)]
    pub open: bool,

    /// Directory for log files (logs to stdout only if not set)
    #[arg(long)]
    pub log_dir: Option<std::path::PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error("state error: {0}")]
    StateError(#[from] airlift_daemon::state::StateError),

    #[error("service failed: {0}")]
    Service(#[from] airlift_daemon::process::ServiceError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Daemon {
    type Error = DaemonError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        // Load state from config path (or default ~/.airlift)
        let state = AppState::load(ctx.config_path.clone())?;

        let port = self.port.unwrap_or(state.config.port);

        let config = ServiceConfig {
            port,
            open_access: self.open,
            port_path: state.port_path.clone(),
            socket_path: state.socket_path.clone(),
            log_level: tracing::Level::INFO,
            log_dir: self.log_dir.clone(),
        };

        spawn_service(&config).await?;
        Ok("server stopped".to_string())
    }
}
