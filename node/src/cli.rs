//! # CLI Interface
//!
//! Command-line argument structure for `solis-node` using `clap` derive.
//! Three subcommands: `init`, `selfcheck`, and `version`. Every configurable
//! value has a corresponding environment variable for container-friendly
//! deployment.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Solis transaction-core node.
///
/// Hosts the Solis transaction pipeline: canonical encoding, verification,
/// and state mutation against the local ledger. Network ingress and block
/// forging attach as separate services.
#[derive(Parser, Debug)]
#[command(
    name = "solis-node",
    about = "Solis transaction-core node",
    version,
    propagate_version = true
)]
pub struct SolisNodeCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the `solis-node` binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a data directory and generate a fresh node keypair.
    Init(InitArgs),
    /// Drive a transfer through the full pipeline against temporary
    /// storage and report each stage. Proves the installation works
    /// without touching real state.
    Selfcheck(SelfcheckArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `init` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct InitArgs {
    /// Path to the data directory to initialize.
    #[arg(long, short = 'd', env = "SOLIS_DATA_DIR", default_value = "~/.solis")]
    pub data_dir: PathBuf,

    /// Overwrite an existing node key. This destroys the previous identity.
    #[arg(long)]
    pub force: bool,

    /// Log verbosity level: trace, debug, info, warn, error.
    #[arg(long, env = "SOLIS_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format: pretty or json.
    #[arg(long, env = "SOLIS_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,
}

/// Arguments for the `selfcheck` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct SelfcheckArgs {
    /// Log verbosity level: trace, debug, info, warn, error.
    #[arg(long, env = "SOLIS_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format: pretty or json.
    #[arg(long, env = "SOLIS_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,
}

/// Resolves the data directory path, expanding the `~` prefix to the
/// user's home directory. Returns the path unchanged otherwise.
pub fn resolve_data_dir(path: &std::path::Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    if path_str.starts_with("~/") || path_str == "~" {
        if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
            return home.join(path_str.strip_prefix("~/").unwrap_or(""));
        }
    }
    path.to_path_buf()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
