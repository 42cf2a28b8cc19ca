use clap::Args;

use airlift_daemon::state::AppState;

#[derive(Args, Debug, Clone)]
pub struct Health;

#[derive(Debug, thiserror::Error)]
pub enum HealthError {
    #[error("Health check failed: {0}")]
    Failed(String),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Health {
    type Error = HealthError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut lines = Vec::new();

        // 1. Check the state directory
        lines.push("State:".to_string());
        let state = match AppState::load(ctx.config_path.clone()) {
            Ok(state) => state,
            Err(e) => {
                lines.push(format!("  error: {}", e));
                return Ok(lines.join("\n"));
            }
        };

        lines.push(format!("  directory:   {}", state.state_dir.display()));
        lines.push(format!("  config port: {}", state.config.port));
        match state.read_port() {
            Ok(port) => lines.push(format!("  port record: {}", port)),
            Err(_) => lines.push("  port record: NONE".to_string()),
        }
        lines.push(format!(
            "  socket:      {}",
            if state.socket_path.exists() {
                "present"
            } else {
                "absent"
            }
        ));

        // 2. Check server liveness on whichever port we'd use next
        let port = state.read_port().unwrap_or(state.config.port);

        lines.push(String::new());
        lines.push(format!("Server (http://localhost:{}):", port));

        let ping_url = format!("http://localhost:{}/ping", port);
        match reqwest::get(&ping_url).await {
            Ok(resp) if resp.status().is_success() => {
                lines.push("  ping: OK".to_string());
            }
            Ok(resp) => {
                lines.push(format!("  ping: UNHEALTHY ({})", resp.status()));
            }
            Err(_) => {
                lines.push("  ping: NOT REACHABLE".to_string());
            }
        }

        Ok(lines.join("\n"))
    }
}
