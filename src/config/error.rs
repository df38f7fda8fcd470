//! Errors raised by the profile store and connection resolution.

use std::path::PathBuf;

use thiserror::Error;

/// Errors for loading, saving and resolving connection profiles.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No suitable user config directory is available.
    #[error("unable to determine config directory (set XDG_CONFIG_HOME or HOME)")]
    ConfigDirUnavailable,

    /// Reading or writing the config file failed.
    #[error("config file {path}: {source}")]
    Io {
        /// File or directory involved.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML for this schema.
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        /// Config file path.
        path: PathBuf,
        /// The underlying TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// The in-memory config could not be serialized.
    #[error("failed to serialize config: {source}")]
    Serialize {
        /// The underlying TOML error.
        #[source]
        source: toml::ser::Error,
    },

    /// No gateway URL from flags, environment, or profile.
    #[error(
        "no gateway URL configured; pass --url, set IGNITION_GATEWAY_URL, or run 'config add'"
    )]
    MissingUrl,

    /// A named profile does not exist.
    #[error("profile '{name}' not found")]
    ProfileNotFound {
        /// Requested profile name.
        name: String,
    },

    /// A config value is outside its accepted range.
    #[error("invalid config value for `{field}`: {value}. Expected {expected}")]
    InvalidValue {
        /// Field name as written in the file.
        field: String,
        /// Offending value.
        value: String,
        /// Accepted values.
        expected: String,
    },
}

impl ConfigError {
    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a profile-not-found error.
    pub fn profile_not_found(name: impl Into<String>) -> Self {
        Self::ProfileNotFound { name: name.into() }
    }
}
