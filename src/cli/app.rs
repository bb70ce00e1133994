use super::commands::AuthCommands;
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "galasactl")]
#[command(about = "A CLI tool for interacting with a Galasa ecosystem")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Flags accepted by every command
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Bootstrap URL or file (overrides GALASA_BOOTSTRAP)
    #[arg(short, long, global = true)]
    pub bootstrap: Option<String>,

    /// Maximum attempts for a rate-limited or rejected request
    #[arg(long, global = true)]
    pub rate_limit_retries: Option<u32>,

    /// Seconds to wait between attempts
    #[arg(long, global = true)]
    pub rate_limit_retry_backoff: Option<f64>,

    /// Write logs to this file, or '-' for stderr
    #[arg(short, long, global = true)]
    pub log: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Authentication management
    Auth(AuthCommands),
    /// Show the resolved bootstrap and API server
    Bootstrap,
}
