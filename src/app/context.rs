//! Shared state handed to every command handler.

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::debug;

use ignition_core::config::{ConnectionFlags, EnvOverrides, resolve_connection};
use ignition_core::output::{self, OutputFormat, TableSpec};
use ignition_core::{ConfigStore, GatewayClient};

use crate::app::terminal::Spinner;
use crate::cli::Cli;

/// Global flags plus the lazily loaded config store.
///
/// Commands that never need the config file (for example `--help` paths or
/// a fully flag-driven connection) still load it on first use, since the
/// default output format lives there too.
pub(crate) struct CommandContext {
    flags: ConnectionFlags,
    format: Option<OutputFormat>,
    quiet: bool,
    store: Option<ConfigStore>,
}

impl CommandContext {
    pub(crate) fn new(cli: &Cli) -> Self {
        Self {
            flags: ConnectionFlags {
                profile: cli.gateway.clone(),
                url: cli.url.clone(),
                token: cli.token.clone(),
            },
            format: cli.format,
            quiet: cli.quiet,
            store: None,
        }
    }

    pub(crate) fn flags(&self) -> &ConnectionFlags {
        &self.flags
    }

    /// The config store, loaded from the default location on first use.
    pub(crate) fn store(&mut self) -> Result<&mut ConfigStore> {
        Ok(match self.store {
            Some(ref mut store) => store,
            None => {
                let loaded = ConfigStore::load_default().context("failed to load configuration")?;
                debug!(path = %loaded.path().display(), "configuration loaded");
                self.store.insert(loaded)
            }
        })
    }

    /// Client for the effective connection (flags > environment > profile).
    pub(crate) fn client(&mut self) -> Result<GatewayClient> {
        let flags = self.flags.clone();
        self.client_with(&flags)
    }

    /// Client for an explicit set of connection flags.
    pub(crate) fn client_with(&mut self, flags: &ConnectionFlags) -> Result<GatewayClient> {
        let env = EnvOverrides::from_env();
        let profile = resolve_connection(flags, &env, self.store()?.config())?;
        debug!(profile = %profile.name, url = %profile.url, "connection resolved");
        Ok(GatewayClient::new(&profile)?)
    }

    /// Client for a stored profile by name, ignoring flags and environment.
    pub(crate) fn client_for_profile(&mut self, name: &str) -> Result<GatewayClient> {
        let flags = ConnectionFlags {
            profile: Some(name.to_string()),
            ..ConnectionFlags::default()
        };
        let profile = resolve_connection(&flags, &EnvOverrides::default(), self.store()?.config())?;
        debug!(profile = %profile.name, url = %profile.url, "target connection resolved");
        Ok(GatewayClient::new(&profile)?)
    }

    /// `--format`, else the configured default, else `command_default`.
    pub(crate) fn output_format(&mut self, command_default: OutputFormat) -> OutputFormat {
        if let Some(format) = self.format {
            return format;
        }
        match self.store() {
            Ok(store) => store.default_format().unwrap_or(command_default),
            Err(error) => {
                debug!(error = %error, "no configured default format");
                command_default
            }
        }
    }

    /// Renders `data` in the effective format and prints it to stdout.
    pub(crate) fn emit(&mut self, data: &Value, spec: &TableSpec) -> Result<()> {
        let format = self.output_format(OutputFormat::Table);
        println!("{}", output::render(data, format, spec)?);
        Ok(())
    }

    pub(crate) fn spinner(&self, message: impl Into<String>) -> Spinner {
        Spinner::start(self.quiet, message)
    }
}
