use std::{fs, path::PathBuf};

use serde::{Deserialize, Serialize};

pub const APP_NAME: &str = "airlift";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const PORT_FILE_NAME: &str = "server.port";
pub const SOCKET_FILE_NAME: &str = "server.sock";
pub const LOG_FILE_NAME: &str = "server.log";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Port the server binds (and the client assumes after spawning one)
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    8966
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

/// Paths and configuration rooted at the per-user state directory (~/.airlift)
///
/// The directory holds everything the two processes exchange through the
/// filesystem: the config file, the server port record, the unix socket
/// endpoint, and the spawned server's log sink.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the state directory (~/.airlift)
    pub state_dir: PathBuf,
    /// Path to the plain-text port record written by the server at startup
    pub port_path: PathBuf,
    /// Path to the unix socket the server listens on for share payloads
    pub socket_path: PathBuf,
    /// Path to the spawned server's log sink
    pub log_path: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Get the state directory path (custom or default ~/.airlift)
    pub fn state_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    /// Load (creating the directory on first use) the app state
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let state_dir = Self::state_dir(custom_path)?;
        fs::create_dir_all(&state_dir)?;

        let config_path = state_dir.join(CONFIG_FILE_NAME);
        let config = if config_path.exists() {
            toml::from_str(&fs::read_to_string(&config_path)?)?
        } else {
            AppConfig::default()
        };

        Ok(Self {
            port_path: state_dir.join(PORT_FILE_NAME),
            socket_path: state_dir.join(SOCKET_FILE_NAME),
            log_path: state_dir.join(LOG_FILE_NAME),
            config_path,
            state_dir,
            config,
        })
    }

    /// Read the recorded server port.
    ///
    /// Fails if no record exists or the record does not parse as a port;
    /// both mean "no known server" to the caller. The record can also be
    /// stale - pointing at a process that died - which only a connectivity
    /// probe can detect.
    pub fn read_port(&self) -> Result<u16, StateError> {
        let data = fs::read_to_string(&self.port_path)?;
        data.trim()
            .parse::<u16>()
            .map_err(|_| StateError::InvalidPortRecord(data))
    }

    /// Record the port this server instance is listening on.
    pub fn write_port(&self, port: u16) -> Result<(), StateError> {
        fs::write(&self.port_path, port.to_string())?;
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("unable to determine home directory")]
    NoHomeDirectory,
    #[error("state i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config file: {0}")]
    InvalidConfig(#[from] toml::de::Error),
    #[error("port record is not a port number: {0:?}")]
    InvalidPortRecord(String),
}
