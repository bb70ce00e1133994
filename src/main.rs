use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};

mod cli;

use cli::{Cli, CommandContext, Commands};

/// Send logs to stderr for "-", to a truncated file otherwise.
/// Without `--log` the default env_logger setup applies (`RUST_LOG`).
fn init_logger(log: Option<&str>) -> Result<()> {
    let mut builder = env_logger::Builder::from_default_env();

    match log {
        None => {}
        Some("-") => {
            builder
                .target(env_logger::Target::Stderr)
                .filter_level(log::LevelFilter::Debug);
        }
        Some(path) => {
            let log_file = std::fs::OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(path)
                .with_context(|| format!("Failed to open log file '{}'", path))?;
            builder
                .target(env_logger::Target::Pipe(Box::new(log_file)))
                .filter_level(log::LevelFilter::Debug);
        }
    }

    builder.init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // A .env file may carry GALASA_TOKEN for headless runs
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();
    init_logger(cli.global.log.as_deref())?;
    info!("Starting galasactl");
    if let Ok(path) = dotenv {
        debug!("Loaded environment from {:?}", path);
    }

    let context = CommandContext::new(&cli.global)?;
    debug!("Galasa home is {:?}", context.galasa_home);

    match cli.command {
        Commands::Auth(auth_args) => {
            cli::commands::auth_command(auth_args, &context).await?;
        }
        Commands::Bootstrap => {
            cli::commands::bootstrap_command(&context).await?;
        }
    }

    Ok(())
}
