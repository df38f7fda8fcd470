//! Effective connection resolution: flag > environment > stored profile.

use std::env;

use super::error::ConfigError;
use super::profile::{ConfigFile, ConnectionProfile, GatewayProfile};
use crate::client::constants::DEFAULT_TIMEOUT_SECS;

/// Environment variable naming the profile to use.
pub const PROFILE_ENV: &str = "IGNITION_GATEWAY_PROFILE";
/// Environment variable overriding the gateway URL.
pub const URL_ENV: &str = "IGNITION_GATEWAY_URL";
/// Environment variable overriding the API token.
pub const TOKEN_ENV: &str = "IGNITION_API_TOKEN";

/// Name given to connections assembled without a stored profile.
pub const ADHOC_PROFILE_NAME: &str = "cli";

/// Connection values passed on the command line.
#[derive(Debug, Clone, Default)]
pub struct ConnectionFlags {
    /// `--gateway <profile>`
    pub profile: Option<String>,
    /// `--url`
    pub url: Option<String>,
    /// `--token`
    pub token: Option<String>,
}

/// Connection values taken from the environment.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    /// `IGNITION_GATEWAY_PROFILE`
    pub profile: Option<String>,
    /// `IGNITION_GATEWAY_URL`
    pub url: Option<String>,
    /// `IGNITION_API_TOKEN`
    pub token: Option<String>,
}

impl EnvOverrides {
    /// Reads the process environment. Blank values count as unset.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            profile: non_empty_env(PROFILE_ENV),
            url: non_empty_env(URL_ENV),
            token: non_empty_env(TOKEN_ENV),
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

/// Resolves the connection to use from flags, environment and stored config.
///
/// The profile is chosen by flag name, then environment name, then the
/// stored default. URL and token each take the first value present from
/// flag, environment, then profile.
///
/// # Errors
///
/// [`ConfigError::ProfileNotFound`] when a named profile does not exist, and
/// [`ConfigError::MissingUrl`] when no URL can be found.
pub fn resolve_connection(
    flags: &ConnectionFlags,
    env: &EnvOverrides,
    config: &ConfigFile,
) -> Result<ConnectionProfile, ConfigError> {
    let requested = flags.profile.as_deref().or(env.profile.as_deref());
    let selected: Option<(&str, &GatewayProfile)> = match requested {
        Some(name) => {
            let profile = config
                .profiles
                .get(name)
                .ok_or_else(|| ConfigError::profile_not_found(name))?;
            Some((name, profile))
        }
        None => config
            .default_profile
            .as_deref()
            .and_then(|name| config.profiles.get(name).map(|profile| (name, profile))),
    };

    let url = flags
        .url
        .as_deref()
        .or(env.url.as_deref())
        .or(selected.map(|(_, profile)| profile.url.as_str()))
        .map(|url| url.trim_end_matches('/').to_string())
        .filter(|url| !url.is_empty())
        .ok_or(ConfigError::MissingUrl)?;

    let token = flags
        .token
        .clone()
        .or_else(|| env.token.clone())
        .or_else(|| selected.and_then(|(_, profile)| profile.token.clone()));

    Ok(match selected {
        Some((name, profile)) => ConnectionProfile {
            name: name.to_string(),
            url,
            token,
            username: profile.username.clone(),
            password: profile.password.clone(),
            verify_ssl: profile.verify_ssl,
            timeout_secs: profile.timeout_secs,
        },
        None => ConnectionProfile {
            name: ADHOC_PROFILE_NAME.to_string(),
            url,
            token,
            username: None,
            password: None,
            verify_ssl: true,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        },
    })
}
