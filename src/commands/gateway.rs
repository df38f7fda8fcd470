//! Gateway command handlers: status, backups, modules, logs and scans.

use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, Local};
use reqwest::Method;
use serde_json::{Map, Value};

use ignition_core::client::{extract_items, read_body};
use ignition_core::output::{TableSpec, cell, field};

use super::{confirm, format_bytes, require_file};
use crate::app::context::CommandContext;
use crate::cli::GatewayCommand;

const DEFAULT_BACKUP_FILE: &str = "gateway-backup.gwbk";
const DEFAULT_LOG_ARCHIVE: &str = "gateway-logs.zip";
const BACKUP_CONTENT_TYPE: &str = "application/octet-stream";

/// Summary fields for `gateway status`: (label, source keys in preference order).
const STATUS_FIELDS: &[(&str, &[&str])] = &[
    ("name", &["name"]),
    ("version", &["ignitionVersion", "version"]),
    ("edition", &["edition"]),
    ("deploymentMode", &["deploymentMode"]),
    ("redundancyRole", &["redundancyRole"]),
];

pub(crate) async fn run_gateway_command(
    ctx: &mut CommandContext,
    command: GatewayCommand,
) -> Result<()> {
    let client = ctx.client()?;
    match command {
        GatewayCommand::Status => {
            let info = {
                let _spinner = ctx.spinner("Checking gateway status...");
                client.get_json("/gateway-info", &[]).await?
            };
            ctx.emit(&status_summary(&info), &TableSpec::kv().with_title("Gateway Status"))
        }
        GatewayCommand::Info => {
            let info = client.get_json("/gateway-info", &[]).await?;
            ctx.emit(&info, &TableSpec::kv().with_title("Gateway Info"))
        }
        GatewayCommand::Backup(output) => {
            let dest = output.output.unwrap_or_else(|| PathBuf::from(DEFAULT_BACKUP_FILE));
            let bytes = {
                let _spinner = ctx.spinner("Downloading gateway backup...");
                client.stream_to_file("/backup", &dest).await?
            };
            println!("Backup saved to {} ({} bytes)", dest.display(), format_bytes(bytes));
            Ok(())
        }
        GatewayCommand::Restore { file, confirm: force } => {
            require_file(&file)?;
            let prompt = format!(
                "Restore backup to gateway '{}'? This will overwrite the current configuration",
                client.gateway_url()
            );
            if !confirm(&prompt, force)? {
                return Ok(());
            }
            let response = {
                let _spinner = ctx.spinner("Uploading backup...");
                client
                    .stream_upload(Method::POST, "/backup", &file, &[], BACKUP_CONTENT_TYPE)
                    .await?
            };
            read_body(response).await?;
            println!("Backup restore initiated.");
            Ok(())
        }
        GatewayCommand::Modules { quarantined } => {
            let (path, title) = if quarantined {
                ("/modules/quarantined", "Quarantined Modules")
            } else {
                ("/modules/healthy", "Installed Modules")
            };
            let modules = client.get_all_items(path, &[], &["modules"]).await?;
            let rows = modules
                .iter()
                .map(|module| {
                    vec![
                        field(module, "name"),
                        field(module, "id"),
                        field(module, "version"),
                        field(module, "state"),
                    ]
                })
                .collect();
            let spec = TableSpec::rows(["Name", "ID", "Version", "State"], rows).with_title(title);
            ctx.emit(&Value::Array(modules), &spec)
        }
        GatewayCommand::Logs { lines, level } => {
            let mut query = vec![("limit", lines.to_string())];
            if let Some(level) = level {
                query.push(("level", level));
            }
            let body = client.get_json("/logs", &query).await?;
            let entries = extract_items(&body, &["logs"]);
            let rows = entries
                .iter()
                .map(|entry| {
                    vec![
                        format_log_timestamp(entry.get("timestamp").unwrap_or(&Value::Null)),
                        field(entry, "level"),
                        field(entry, "logger"),
                        field(entry, "message"),
                    ]
                })
                .collect();
            let spec = TableSpec::rows(["Timestamp", "Level", "Logger", "Message"], rows)
                .with_title("Gateway Logs");
            ctx.emit(&Value::Array(entries), &spec)
        }
        GatewayCommand::LogDownload(output) => {
            let dest = output.output.unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_ARCHIVE));
            let bytes = {
                let _spinner = ctx.spinner("Downloading gateway logs...");
                client.stream_to_file("/logs/download", &dest).await?
            };
            println!("Logs saved to {} ({} bytes)", dest.display(), format_bytes(bytes));
            Ok(())
        }
        GatewayCommand::Loggers => {
            let loggers = client.get_all_items("/logs/loggers", &[], &["loggers"]).await?;
            let rows = loggers
                .iter()
                .map(|logger| vec![field(logger, "name"), field(logger, "level")])
                .collect();
            let spec = TableSpec::rows(["Name", "Level"], rows).with_title("Loggers");
            ctx.emit(&Value::Array(loggers), &spec)
        }
        GatewayCommand::ScanProjects => {
            client.post_json("/scan/projects", None).await?;
            println!("Project scan triggered.");
            Ok(())
        }
        GatewayCommand::ScanConfig => {
            client.post_json("/scan/config", None).await?;
            println!("Config scan triggered.");
            Ok(())
        }
        GatewayCommand::EntityBrowse { path, depth } => {
            let mut query = vec![("depth", depth.to_string())];
            if let Some(path) = path {
                query.push(("path", path));
            }
            let tree = client.get_json("/entity/browse", &query).await?;
            ctx.emit(&tree, &TableSpec::new().with_title("Entity Browser"))
        }
    }
}

/// Picks the headline fields out of `/gateway-info`, skipping empty ones.
fn status_summary(info: &Value) -> Value {
    let mut summary = Map::new();
    for (label, keys) in STATUS_FIELDS {
        let value = keys
            .iter()
            .filter_map(|key| info.get(*key))
            .find(|value| !is_blank(value));
        if let Some(value) = value {
            summary.insert((*label).to_string(), value.clone());
        }
    }
    Value::Object(summary)
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.is_empty(),
        _ => false,
    }
}

/// Epoch milliseconds become local `YYYY-MM-DD HH:MM:SS`; anything else is shown as-is.
fn format_log_timestamp(value: &Value) -> String {
    value
        .as_i64()
        .and_then(DateTime::from_timestamp_millis)
        .map_or_else(
            || cell(value),
            |time| time.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string(),
        )
}
