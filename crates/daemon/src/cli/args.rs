pub use clap::Parser;

use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "airlift")]
#[command(about = "Share one local file with devices on your network")]
pub struct Args {
    /// Path to the airlift state directory (defaults to ~/.airlift)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: crate::Command,
}
