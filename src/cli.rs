//! CLI definition using clap.

use std::path::PathBuf;

use clap::Parser;

/// Actor directory service
#[derive(Parser, Debug)]
#[command(name = "actordir")]
#[command(version)]
#[command(about = "Actor metadata registry with change notifications")]
#[command(
    long_about = "Runs an in-process actor directory: actor creation, lookup by id or name, checkpoints, and a notification channel that logs every actor change."
)]
pub struct Cli {
    /// TOML configuration file (defaults apply when omitted)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset, overriding the config file
    #[arg(short, long)]
    pub log_filter: Option<String>,
}
