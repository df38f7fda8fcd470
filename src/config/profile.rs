//! Stored and resolved connection profiles.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::error::ConfigError;
use crate::client::constants::{DEFAULT_TIMEOUT_SECS, MAX_TIMEOUT_SECS};
use crate::output::OutputFormat;

/// One `[profiles.<name>]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayProfile {
    /// Gateway base URL, e.g. `https://gw:8043`.
    pub url: String,
    /// API token (`keyId:secret`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Basic auth username.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Basic auth password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Verify the gateway's TLS certificate.
    #[serde(default = "default_verify_ssl", skip_serializing_if = "is_true")]
    pub verify_ssl: bool,
    /// Request timeout in seconds.
    #[serde(
        rename = "timeout",
        default = "default_timeout_secs",
        skip_serializing_if = "is_default_timeout"
    )]
    pub timeout_secs: u64,
}

impl GatewayProfile {
    /// A profile with only a URL; everything else at its default.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: None,
            username: None,
            password: None,
            verify_ssl: true,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidValue`] when `timeout` is outside `1..=3600`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_timeout_secs(self.timeout_secs)
    }
}

fn default_verify_ssl() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_true(value: &bool) -> bool {
    *value
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_default_timeout(value: &u64) -> bool {
    *value == DEFAULT_TIMEOUT_SECS
}

/// Validates a timeout against `1..=3600` seconds.
///
/// # Errors
///
/// [`ConfigError::InvalidValue`] naming the `timeout` field.
pub fn validate_timeout_secs(value: u64) -> Result<(), ConfigError> {
    if !(1..=MAX_TIMEOUT_SECS).contains(&value) {
        return Err(ConfigError::InvalidValue {
            field: "timeout".to_string(),
            value: value.to_string(),
            expected: format!("range 1..={MAX_TIMEOUT_SECS}"),
        });
    }
    Ok(())
}

/// Whole contents of `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Profile used when none is named.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_profile: Option<String>,
    /// Output format used when `--format` is not given.
    #[serde(default, skip_serializing_if = "is_default_format")]
    pub default_format: Option<OutputFormat>,
    /// Profiles keyed by name, kept in name order.
    #[serde(default)]
    pub profiles: BTreeMap<String, GatewayProfile>,
}

#[allow(clippy::ref_option)]
fn is_default_format(value: &Option<OutputFormat>) -> bool {
    matches!(value, None | Some(OutputFormat::Table))
}

/// A fully resolved connection descriptor.
///
/// The only form in which connection settings reach the HTTP client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionProfile {
    /// Profile name, or `cli` when assembled from flags and environment.
    pub name: String,
    /// Gateway base URL without a trailing slash.
    pub url: String,
    /// API token.
    pub token: Option<String>,
    /// Basic auth username.
    pub username: Option<String>,
    /// Basic auth password.
    pub password: Option<String>,
    /// Verify the gateway's TLS certificate.
    pub verify_ssl: bool,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}
