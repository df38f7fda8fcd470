//! CLI command routing: hands each command group to its handler module.

use anyhow::Result;

use crate::app::context::CommandContext;
use crate::cli::{Cli, Command};
use crate::commands;

/// Runs the command selected on the command line.
pub(crate) async fn dispatch(cli: Cli) -> Result<()> {
    let mut ctx = CommandContext::new(&cli);
    match cli.command {
        Command::Config { command } => commands::run_config_command(&mut ctx, command).await,
        Command::Gateway { command } => commands::run_gateway_command(&mut ctx, command).await,
        Command::Project { command } => commands::run_project_command(&mut ctx, command).await,
        Command::Perspective { command } => {
            commands::run_perspective_command(&mut ctx, command).await
        }
        Command::Resource { command } => commands::run_resource_command(&mut ctx, command).await,
        Command::Mode { command } => commands::run_mode_command(&mut ctx, command).await,
        Command::Tag { command } => commands::run_tag_command(&mut ctx, command).await,
        Command::Device { command } => commands::run_device_command(&mut ctx, command).await,
        Command::Api { command } => commands::run_api_command(&mut ctx, command).await,
    }
}
