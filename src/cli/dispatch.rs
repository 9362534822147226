//! Command dispatch logic extracted from binary to reduce main function size.

use super::args::Commands;
use super::handlers::{handle_history, handle_run, RunArgs};
use crate::config::Config;
use crate::exit::A11yExit;
use anyhow::{Context, Result};
use std::path::Path;

/// Executes the parsed command.
///
/// # Errors
/// Returns error if the config cannot be loaded or the handler fails.
pub fn execute(command: Commands, config_path: Option<&Path>) -> Result<A11yExit> {
    let config = Config::load(config_path).context("Failed to load configuration")?;

    match command {
        Commands::Run {
            input,
            site,
            baseline,
            json,
        } => handle_run(
            &config,
            &RunArgs {
                input,
                site,
                baseline,
                json,
            },
        ),
        Commands::History { site, json } => handle_history(&config, &site, json),
    }
}
