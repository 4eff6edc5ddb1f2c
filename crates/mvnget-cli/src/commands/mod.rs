//! Command dispatch and handler modules.

mod compare;
mod fetch;

use miette::Result;
use mvnget_core::config::Config;

use crate::cli::{Cli, Command};

/// Route a parsed CLI invocation to the appropriate command handler.
pub async fn dispatch(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Command::Fetch(args) => fetch::exec(args, config).await,
        Command::Compare { a, b } => compare::exec(&a, &b),
    }
}
