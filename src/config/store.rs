//! Persistent profile store (`config.toml`).
//!
//! The file lives at `$XDG_CONFIG_HOME/ignition-cli/config.toml`, falling
//! back to `$HOME/.config/ignition-cli/` and then `%APPDATA%/ignition-cli/`.
//! It may hold credentials, so it is written owner-only.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::error::ConfigError;
use super::profile::{ConfigFile, GatewayProfile};
use crate::output::OutputFormat;

const APP_DIR_NAME: &str = "ignition-cli";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Loaded configuration bound to its file path.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    config: ConfigFile,
}

impl ConfigStore {
    /// Returns the default config file path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ConfigDirUnavailable`] if no usable config dir is found.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        Ok(default_config_dir()?.join(CONFIG_FILE_NAME))
    }

    /// Loads the store from the default path.
    ///
    /// # Errors
    ///
    /// See [`Self::load`].
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load(Self::default_path()?)
    }

    /// Loads the store from `path`. A missing file is an empty configuration.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] when the file exists but cannot be read,
    /// [`ConfigError::Parse`] for invalid TOML, and
    /// [`ConfigError::InvalidValue`] for out-of-range values.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        if !path.exists() {
            debug!(path = %path.display(), "no config file; using empty configuration");
            return Ok(Self {
                path,
                config: ConfigFile::default(),
            });
        }

        let raw = fs::read_to_string(&path).map_err(|e| ConfigError::io(&path, e))?;
        let config: ConfigFile = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;
        for profile in config.profiles.values() {
            profile.validate()?;
        }

        debug!(path = %path.display(), profiles = config.profiles.len(), "loaded config");
        Ok(Self { path, config })
    }

    /// Writes the store back to its path (directory `0700`, file `0600`).
    ///
    /// # Errors
    ///
    /// [`ConfigError::Serialize`] or [`ConfigError::Io`].
    pub fn save(&self) -> Result<(), ConfigError> {
        let raw = toml::to_string_pretty(&self.config)
            .map_err(|source| ConfigError::Serialize { source })?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::io(parent, e))?;
            set_permissions(parent, 0o700)?;
        }
        write_private(&self.path, raw.as_bytes())?;

        debug!(path = %self.path.display(), "saved config");
        Ok(())
    }

    /// Path this store loads from and saves to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The parsed configuration.
    #[must_use]
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Looks up a profile by name.
    #[must_use]
    pub fn profile(&self, name: &str) -> Option<&GatewayProfile> {
        self.config.profiles.get(name)
    }

    /// Profiles in name order.
    pub fn profiles(&self) -> impl Iterator<Item = (&str, &GatewayProfile)> {
        self.config
            .profiles
            .iter()
            .map(|(name, profile)| (name.as_str(), profile))
    }

    /// Name of the default profile, if any.
    #[must_use]
    pub fn default_profile(&self) -> Option<&str> {
        self.config.default_profile.as_deref()
    }

    /// Configured default output format.
    #[must_use]
    pub fn default_format(&self) -> Option<OutputFormat> {
        self.config.default_format
    }

    /// Inserts or replaces a profile. The first profile added becomes the default.
    ///
    /// Returns `true` when an existing profile was replaced.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidValue`] when the profile fails validation.
    pub fn add_profile(
        &mut self,
        name: impl Into<String>,
        profile: GatewayProfile,
    ) -> Result<bool, ConfigError> {
        profile.validate()?;
        let name = name.into();
        let replaced = self.config.profiles.insert(name.clone(), profile).is_some();
        if self.config.default_profile.is_none() {
            self.config.default_profile = Some(name);
        }
        Ok(replaced)
    }

    /// Removes a profile, returning whether it existed.
    ///
    /// Removing the default moves the default to the first remaining profile
    /// in name order, or clears it.
    pub fn remove_profile(&mut self, name: &str) -> bool {
        if self.config.profiles.remove(name).is_none() {
            return false;
        }
        if self.config.default_profile.as_deref() == Some(name) {
            self.config.default_profile = self.config.profiles.keys().next().cloned();
        }
        true
    }

    /// Marks an existing profile as the default.
    ///
    /// # Errors
    ///
    /// [`ConfigError::ProfileNotFound`] for unknown names.
    pub fn set_default(&mut self, name: &str) -> Result<(), ConfigError> {
        if !self.config.profiles.contains_key(name) {
            return Err(ConfigError::profile_not_found(name));
        }
        self.config.default_profile = Some(name.to_string());
        Ok(())
    }
}

fn default_config_dir() -> Result<PathBuf, ConfigError> {
    resolve_config_dir(
        sanitize_env_path(env::var_os("XDG_CONFIG_HOME")),
        sanitize_env_path(env::var_os("HOME")),
        sanitize_env_path(env::var_os("APPDATA")),
    )
}

fn sanitize_env_path(value: Option<OsString>) -> Option<PathBuf> {
    let value = value?;
    if value.to_string_lossy().trim().is_empty() {
        return None;
    }

    Some(PathBuf::from(value))
}

fn resolve_config_dir(
    xdg_config_home: Option<PathBuf>,
    home: Option<PathBuf>,
    app_data: Option<PathBuf>,
) -> Result<PathBuf, ConfigError> {
    if let Some(xdg) = xdg_config_home {
        return Ok(xdg.join(APP_DIR_NAME));
    }
    if let Some(home) = home {
        return Ok(home.join(".config").join(APP_DIR_NAME));
    }
    if let Some(app_data) = app_data {
        return Ok(app_data.join(APP_DIR_NAME));
    }

    Err(ConfigError::ConfigDirUnavailable)
}

#[cfg(unix)]
fn set_permissions(path: &Path, mode: u32) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(mode))
        .map_err(|e| ConfigError::io(path, e))
}

#[cfg(not(unix))]
fn set_permissions(_path: &Path, _mode: u32) -> Result<(), ConfigError> {
    Ok(())
}

/// Writes `contents` to a file that is `0600` from the moment it exists.
///
/// An existing file keeps its inode, so its mode is tightened as well.
#[cfg(unix)]
fn write_private(path: &Path, contents: &[u8]) -> Result<(), ConfigError> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
        .map_err(|e| ConfigError::io(path, e))?;
    set_permissions(path, 0o600)?;
    file.write_all(contents).map_err(|e| ConfigError::io(path, e))
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &[u8]) -> Result<(), ConfigError> {
    fs::write(path, contents).map_err(|e| ConfigError::io(path, e))
}
