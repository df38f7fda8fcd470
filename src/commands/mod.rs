//! CLI command handlers, one module per command group.

mod api;
mod config;
mod device;
mod gateway;
mod mode;
mod perspective;
mod project;
mod resource;
mod tag;

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;
use thiserror::Error;

use crate::cli::ForceArgs;

pub(crate) use api::run_api_command;
pub(crate) use config::run_config_command;
pub(crate) use device::run_device_command;
pub(crate) use gateway::run_gateway_command;
pub(crate) use mode::run_mode_command;
pub(crate) use perspective::run_perspective_command;
pub(crate) use project::run_project_command;
pub(crate) use resource::run_resource_command;
pub(crate) use tag::run_tag_command;

/// User-input errors raised by command handlers.
#[derive(Debug, Error)]
pub(crate) enum CommandError {
    /// A JSON option could not be parsed.
    #[error("invalid JSON input: {0}")]
    InvalidJson(#[source] serde_json::Error),

    /// A local input file does not exist.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// A resource type without a `/`.
    #[error("invalid resource type '{0}'; use module/type format (e.g. ignition/database-connection)")]
    InvalidResourceType(String),

    /// The gateway returned a resource without the signature a write needs.
    #[error("no signature found on resource '{name}'; {hint}")]
    MissingSignature {
        /// Resource name.
        name: String,
        /// What the user can do about it.
        hint: &'static str,
    },

    /// Something looked up locally in a gateway response does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// Invalid combination of arguments.
    #[error("{0}")]
    Usage(String),
}

/// Parses a JSON option given literally or as `@path`.
pub(crate) fn parse_json_input(value: &str) -> Result<Value> {
    let text = match value.strip_prefix('@') {
        Some(path) => {
            let path = Path::new(path);
            require_file(path)?;
            fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?
        }
        None => value.to_string(),
    };
    Ok(serde_json::from_str(&text).map_err(CommandError::InvalidJson)?)
}

/// Fails with [`CommandError::FileNotFound`] unless `path` exists.
pub(crate) fn require_file(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(CommandError::FileNotFound(path.to_path_buf()).into())
    }
}

/// Splits `module/type`.
pub(crate) fn split_resource_type(resource_type: &str) -> Result<(&str, &str), CommandError> {
    resource_type
        .split_once('/')
        .filter(|(module, kind)| !module.is_empty() && !kind.is_empty())
        .ok_or_else(|| CommandError::InvalidResourceType(resource_type.to_string()))
}

/// Asks `prompt [y/N]` on stdin unless `--force` was given.
///
/// Prints `Cancelled.` and returns `false` on anything but yes.
pub(crate) fn confirm(prompt: &str, confirm: ForceArgs) -> Result<bool> {
    if confirm.force {
        return Ok(true);
    }
    let mut stdout = io::stdout();
    write!(stdout, "{prompt} [y/N] ")?;
    stdout.flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    let accepted = is_affirmative(&answer);
    if !accepted {
        println!("Cancelled.");
    }
    Ok(accepted)
}

fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// `1234567` -> `1,234,567`.
pub(crate) fn format_bytes(bytes: u64) -> String {
    let digits = bytes.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
