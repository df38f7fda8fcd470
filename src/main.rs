//! CLI entry point for ignition-cli.

// Clippy lints - same strictness as the library
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::process::ExitCode;

use clap::Parser;
use tracing::debug;

mod app;
mod cli;
mod commands;

use app::{command_dispatcher, exit_handler, terminal};
use cli::Cli;

/// Process exit statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcessExit {
    /// Success, or the user declined a confirmation.
    Success,
    /// General or usage error.
    Failure,
    /// Gateway unreachable, timed out or malformed URL.
    Connection,
    /// Rejected credentials.
    Authentication,
    /// Remote 404 or missing project content.
    NotFound,
    /// Remote 409 or resource already exists.
    Conflict,
    /// Profile or config file problem.
    Configuration,
    /// Gateway rejected the request body.
    Validation,
    /// Project archive content is unusable.
    MalformedData,
}

impl ProcessExit {
    pub(crate) fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Failure => 1,
            Self::Connection => 2,
            Self::Authentication => 3,
            Self::NotFound => 4,
            Self::Conflict => 5,
            Self::Configuration => 6,
            Self::Validation => 7,
            Self::MalformedData => 8,
        }
    }
}

impl From<ProcessExit> for ExitCode {
    fn from(exit: ProcessExit) -> Self {
        ExitCode::from(exit.code())
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Parse before tracing so --help and usage errors print without log noise.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return if error.use_stderr() {
                ProcessExit::Failure.into()
            } else {
                ProcessExit::Success.into()
            };
        }
    };

    let no_color = terminal::should_disable_color(
        terminal::no_color_env_requested(),
        terminal::is_dumb_terminal(),
    );
    terminal::init_tracing(terminal::default_log_level(cli.verbose, cli.quiet), no_color);
    debug!(command = ?cli.command, "CLI arguments parsed");

    match command_dispatcher::dispatch(cli).await {
        Ok(()) => ProcessExit::Success.into(),
        Err(error) => {
            eprintln!("Error: {error:#}");
            exit_handler::exit_outcome_for(&error).into()
        }
    }
}
