use std::path::PathBuf;

/// Runtime configuration for one server instance
#[derive(Debug, Clone)]
pub struct Config {
    // http server configuration
    /// Port the HTTP server binds on all interfaces
    pub port: u16,
    /// Accept `?path=` downloads with no capability token.
    /// Off by default; this is the reduced, trusted-network mode.
    pub open_access: bool,

    // filesystem endpoints shared with the client process
    /// Where to record the bound port for later client invocations
    pub port_path: PathBuf,
    /// Unix socket path the IPC listener binds
    pub socket_path: PathBuf,

    // logging
    pub log_level: tracing::Level,
    /// Directory for log files (optional, logs to stdout only if not set)
    pub log_dir: Option<PathBuf>,
}
