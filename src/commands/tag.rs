//! Tag command handlers.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use reqwest::Method;
use serde_json::{Value, json};
use tracing::warn;

use ignition_core::client::{GatewayError, RequestBody, extract_items, read_body};
use ignition_core::output::{TableSpec, TreeNode, cell, field, render_json, render_tree};
use ignition_core::{GatewayClient, OutputFormat};

use super::{CommandError, require_file};
use crate::app::context::CommandContext;
use crate::cli::TagCommand;

const READ_WRITE_HINT: &str = "tag read/write needs a custom endpoint on the gateway \
(e.g. a WebDev resource at /data/api/v1/tags/read); stock Ignition 8.3 does not provide one";

pub(crate) async fn run_tag_command(ctx: &mut CommandContext, command: TagCommand) -> Result<()> {
    let client = ctx.client()?;
    match command {
        TagCommand::Browse {
            path,
            recursive,
            provider,
        } => {
            let query = export_query(&provider.provider, path.as_deref(), recursive);
            let tags = client.get_json("/tags/export", &query).await?;
            if ctx.output_format(OutputFormat::Table) != OutputFormat::Table {
                return ctx.emit(&tags, &TableSpec::new());
            }
            let root = format!("[{}]{}", provider.provider, path.unwrap_or_default());
            println!("{}", render_tree(&root, &tag_nodes(&tags, recursive)));
            Ok(())
        }
        TagCommand::Read { paths, provider } => {
            warn!("tag read uses a non-standard endpoint");
            let query = [("provider", provider.provider)];
            let response = client
                .request(Method::POST, "/tags/read", &query, RequestBody::Json(json!(paths)))
                .await
                .map_err(custom_endpoint_error)?;
            let values = read_body(response).await?;
            let items = extract_items(&values, &["values", "tags"]);
            let rows = items
                .iter()
                .map(|item| {
                    vec![
                        field(item, "path"),
                        field(item, "value"),
                        field(item, "quality"),
                        field(item, "timestamp"),
                    ]
                })
                .collect();
            let spec = TableSpec::rows(["Path", "Value", "Quality", "Timestamp"], rows)
                .with_title("Tag Values");
            ctx.emit(&Value::Array(items), &spec)
        }
        TagCommand::Write {
            path,
            value,
            provider,
        } => {
            warn!("tag write uses a non-standard endpoint");
            let body = json!([{"path": path, "value": parse_tag_value(&value)}]);
            let query = [("provider", provider.provider)];
            let response = client
                .request(Method::POST, "/tags/write", &query, RequestBody::Json(body))
                .await
                .map_err(custom_endpoint_error)?;
            read_body(response).await?;
            println!("Wrote {value} to {path}.");
            Ok(())
        }
        TagCommand::Export {
            path,
            output,
            provider,
        } => {
            let query = export_query(&provider.provider, path.as_deref(), true);
            let tags = client.get_json("/tags/export", &query).await?;
            let text = render_json(&tags)?;
            match output.output {
                Some(dest) => {
                    fs::write(&dest, format!("{text}\n"))
                        .with_context(|| format!("failed to write {}", dest.display()))?;
                    println!("Tags exported to {}", dest.display());
                }
                None => println!("{text}"),
            }
            Ok(())
        }
        TagCommand::Import {
            file,
            collision_policy,
            path,
            provider,
        } => {
            require_file(&file)?;
            let (file_type, content_type) = import_type(&file)?;
            let mut query = vec![
                ("provider", provider.provider),
                ("type", file_type.to_string()),
                ("collisionPolicy", collision_policy),
            ];
            if let Some(path) = path {
                query.push(("path", path));
            }
            let response = client
                .stream_upload(Method::POST, "/tags/import", &file, &query, content_type)
                .await?;
            let result = read_body(response).await?;
            println!("Tags imported from {}.", file.display());
            if result.is_null() {
                Ok(())
            } else {
                ctx.emit(&result, &TableSpec::new())
            }
        }
        TagCommand::Providers => {
            let providers = list_providers(&client).await?;
            let rows = providers
                .iter()
                .map(|provider| {
                    vec![
                        field(provider, "name"),
                        pointer(provider, "/config/profile/type"),
                        pointer(provider, "/metrics/tagCount/metric/value"),
                        pointer(provider, "/healthchecks/status/result/message"),
                    ]
                })
                .collect();
            let spec = TableSpec::rows(["Name", "Profile", "Tags", "Status"], rows)
                .with_title("Tag Providers");
            ctx.emit(&Value::Array(providers), &spec)
        }
    }
}

async fn list_providers(client: &GatewayClient) -> Result<Vec<Value>> {
    Ok(client
        .get_all_items("/resources/list/ignition/tag-provider", &[], &["resources"])
        .await?)
}

fn export_query(
    provider: &str,
    path: Option<&str>,
    recursive: bool,
) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("provider", provider.to_string()),
        ("type", "json".to_string()),
    ];
    if let Some(path) = path {
        query.push(("path", path.to_string()));
    }
    if recursive {
        query.push(("recursive", "true".to_string()));
    }
    query
}

/// A 404 from `/tags/read` or `/tags/write` means the custom endpoint is missing.
fn custom_endpoint_error(error: GatewayError) -> anyhow::Error {
    if matches!(error, GatewayError::NotFound { .. }) {
        anyhow::anyhow!(READ_WRITE_HINT)
    } else {
        error.into()
    }
}

/// JSON when it parses (`42`, `true`, `{"a":1}`), otherwise the raw string.
fn parse_tag_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::from(raw))
}

fn import_type(file: &Path) -> Result<(&'static str, &'static str), CommandError> {
    let extension = file
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("json") => Ok(("json", "application/json")),
        Some("xml") => Ok(("xml", "application/octet-stream")),
        Some("csv") => Ok(("csv", "application/octet-stream")),
        _ => Err(CommandError::Usage(format!(
            "cannot tell the tag file type of {}; use a .json, .xml or .csv file",
            file.display()
        ))),
    }
}

fn pointer(value: &Value, path: &str) -> String {
    value.pointer(path).map(cell).unwrap_or_default()
}

fn tag_nodes(tags: &Value, recursive: bool) -> Vec<TreeNode> {
    extract_items(tags, &["tags"])
        .iter()
        .map(|tag| {
            let name = field(tag, "name");
            let tag_type = field(tag, "tagType");
            let is_folder = matches!(tag_type.as_str(), "Folder" | "UdtInstance");
            let label = if is_folder {
                format!("{name}/")
            } else {
                match field(tag, "dataType") {
                    data_type if data_type.is_empty() => name,
                    data_type => format!("{name} ({data_type})"),
                }
            };
            let children = if recursive {
                tag_nodes(tag, true)
            } else {
                Vec::new()
            };
            TreeNode { label, children }
        })
        .collect()
}
