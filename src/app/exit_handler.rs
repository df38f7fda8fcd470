//! Exit code logic for the ignition-cli process.
//!
//! Single responsibility: map a failed command's error chain to the process exit outcome.

use ignition_core::{ArchiveError, ConfigError, GatewayError, OutputError};

use crate::ProcessExit;
use crate::commands::CommandError;

/// Walks the error chain and returns the status of the first typed error found.
pub(crate) fn exit_outcome_for(error: &anyhow::Error) -> ProcessExit {
    for cause in error.chain() {
        if let Some(gateway) = cause.downcast_ref::<GatewayError>() {
            return gateway_outcome(gateway);
        }
        if let Some(archive) = cause.downcast_ref::<ArchiveError>() {
            return archive_outcome(archive);
        }
        if cause.downcast_ref::<ConfigError>().is_some() {
            return ProcessExit::Configuration;
        }
        if let Some(command) = cause.downcast_ref::<CommandError>() {
            return command_outcome(command);
        }
        if cause.downcast_ref::<OutputError>().is_some() {
            return ProcessExit::Failure;
        }
    }
    ProcessExit::Failure
}

fn gateway_outcome(error: &GatewayError) -> ProcessExit {
    match error {
        GatewayError::Authentication { .. } => ProcessExit::Authentication,
        GatewayError::NotFound { .. } => ProcessExit::NotFound,
        GatewayError::Conflict { .. } => ProcessExit::Conflict,
        GatewayError::Validation { .. } => ProcessExit::Validation,
        other if other.is_transport() => ProcessExit::Connection,
        _ => ProcessExit::Failure,
    }
}

fn archive_outcome(error: &ArchiveError) -> ProcessExit {
    match error {
        ArchiveError::Gateway(inner) => gateway_outcome(inner),
        ArchiveError::EntryNotFound { .. } | ArchiveError::ResourceNotFound { .. } => {
            ProcessExit::NotFound
        }
        ArchiveError::AlreadyExists { .. } => ProcessExit::Conflict,
        other if other.is_malformed_data() => ProcessExit::MalformedData,
        _ => ProcessExit::Failure,
    }
}

fn command_outcome(error: &CommandError) -> ProcessExit {
    match error {
        CommandError::NotFound(_) => ProcessExit::NotFound,
        CommandError::InvalidJson(_)
        | CommandError::FileNotFound(_)
        | CommandError::InvalidResourceType(_)
        | CommandError::MissingSignature { .. }
        | CommandError::Usage(_) => ProcessExit::Failure,
    }
}
