//! Ignition gateway client library.
//!
//! Reusable pieces behind the `ignition-cli` binary:
//!
//! - [`client`] - REST client with typed errors, retries, pagination and streaming
//! - [`config`] - connection profile store and effective-connection resolution
//! - [`archive`] - project export/import round trips
//! - [`perspective`] - Perspective resource layout and edits inside a working tree
//! - [`output`] - table, JSON, YAML and CSV rendering
//! - [`sync`] - cross-gateway project diff and directory watch

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod archive;
pub mod client;
pub mod config;
pub mod output;
pub mod perspective;
pub mod sync;

#[cfg(test)]
pub mod test_support;

// Re-export commonly used types
pub use archive::{ArchiveError, ProjectArchive, with_mutable_project, with_project_archive};
pub use client::{GatewayClient, GatewayError, ProjectTransfer};
pub use config::{ConfigError, ConfigStore, ConnectionProfile};
pub use output::{OutputError, OutputFormat, TableSpec};
pub use perspective::ResourceKind;
