//! mvnget CLI binary.
//!
//! Loads the configuration, initializes logging via `tracing`, parses
//! arguments with `clap`, and dispatches to the command handler.

mod cli;
mod commands;

use miette::Result;
use mvnget_core::config::{Config, LogLevel};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::parse();

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(level) = LogLevel::from_verbosity(args.verbose) {
        config.log_level = level;
    }
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_filter())),
        )
        .with_writer(std::io::stderr)
        .init();
    // Batch mode follows what is actually logged, `RUST_LOG` included.
    config.log_level = LogLevel::from_level_filter(LevelFilter::current());

    commands::dispatch(args, config).await
}
