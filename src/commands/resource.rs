//! Generic gateway resource handlers (`module/type` addressed).

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::Result;
use reqwest::Method;
use serde_json::{Value, json};

use ignition_core::{GatewayClient, OutputFormat};
use ignition_core::client::{encode_segment, read_body};
use ignition_core::output::{TableSpec, cell, field};

use super::{
    CommandError, confirm, format_bytes, parse_json_input, require_file, split_resource_type,
};
use crate::app::context::CommandContext;
use crate::cli::ResourceCommand;

const LIST_PATH_MARKER: &str = "/data/api/v1/resources/list/";
const DATAFILE_CONTENT_TYPE: &str = "application/octet-stream";

pub(crate) async fn run_resource_command(
    ctx: &mut CommandContext,
    command: ResourceCommand,
) -> Result<()> {
    match command {
        ResourceCommand::List { resource_type } => {
            let (module, kind) = split_resource_type(&resource_type)?;
            let client = ctx.client()?;
            let resources = client
                .get_all_items(&format!("/resources/list/{module}/{kind}"), &[], &["resources"])
                .await?;
            let rows = resources
                .iter()
                .map(|resource| {
                    vec![
                        field(resource, "name"),
                        field(resource, "type"),
                        field(resource, "state"),
                    ]
                })
                .collect();
            let spec = TableSpec::rows(["Name", "Type", "State"], rows)
                .with_title(format!("Resources: {resource_type}"));
            ctx.emit(&Value::Array(resources), &spec)
        }
        ResourceCommand::Show {
            resource_type,
            name,
        } => {
            let (module, kind) = split_resource_type(&resource_type)?;
            let client = ctx.client()?;
            let resource = find(&client, module, kind, &name).await?;
            let title = format!("{resource_type}: {name}");
            let shown = if ctx.output_format(OutputFormat::Table) == OutputFormat::Table {
                flatten_lists(resource)
            } else {
                resource
            };
            ctx.emit(&shown, &TableSpec::kv().with_title(title))
        }
        ResourceCommand::Create {
            resource_type,
            name,
            config,
        } => {
            let (module, kind) = split_resource_type(&resource_type)?;
            let body = creation_body(&name, config.as_deref())?;
            let client = ctx.client()?;
            let result = client
                .post_json(&format!("/resources/{module}/{kind}"), Some(json!([body])))
                .await?;
            println!("Resource '{name}' created.");
            print_changes(ctx, &result)
        }
        ResourceCommand::Update {
            resource_type,
            name,
            config,
        } => {
            let (module, kind) = split_resource_type(&resource_type)?;
            let mut body = parse_json_input(&config)?;
            let client = ctx.client()?;
            if let Value::Object(map) = &mut body {
                map.entry("name").or_insert_with(|| Value::from(name.as_str()));
                if !map.contains_key("signature") {
                    let signature = fetch_signature(
                        &client,
                        module,
                        kind,
                        &name,
                        "include 'signature' in config",
                    )
                    .await?;
                    map.insert("signature".to_string(), Value::from(signature));
                }
            }
            let result = client
                .put_json(&format!("/resources/{module}/{kind}"), Some(json!([body])))
                .await?;
            println!("Resource '{name}' updated.");
            print_changes(ctx, &result)
        }
        ResourceCommand::Delete {
            resource_type,
            name,
            signature,
            confirm: force,
        } => {
            let (module, kind) = split_resource_type(&resource_type)?;
            if !confirm(&format!("Delete {resource_type}/{name}?"), force)? {
                return Ok(());
            }
            let client = ctx.client()?;
            let signature = match signature {
                Some(signature) => signature,
                None => {
                    fetch_signature(&client, module, kind, &name, "pass --signature").await?
                }
            };
            let path = format!(
                "/resources/{module}/{kind}/{}/{}",
                encode_segment(&name),
                encode_segment(&signature)
            );
            client.delete(&path, &[]).await?;
            println!("Resource '{name}' deleted.");
            Ok(())
        }
        ResourceCommand::Names { resource_type } => {
            let (module, kind) = split_resource_type(&resource_type)?;
            let client = ctx.client()?;
            let names = client
                .get_all_items(&format!("/resources/names/{module}/{kind}"), &[], &["names"])
                .await?;
            let rows = names.iter().map(|name| vec![cell(name)]).collect();
            let spec = TableSpec::rows(["Name"], rows).with_title(format!("Names: {resource_type}"));
            ctx.emit(&Value::Array(names), &spec)
        }
        ResourceCommand::Upload {
            resource_type,
            name,
            file,
            signature,
            filename,
        } => {
            let (module, kind) = split_resource_type(&resource_type)?;
            require_file(&file)?;
            let filename = match filename {
                Some(filename) => filename,
                None => file
                    .file_name()
                    .and_then(|name| name.to_str())
                    .map(str::to_string)
                    .ok_or_else(|| {
                        CommandError::Usage(format!(
                            "cannot derive a file name from {}; pass --filename",
                            file.display()
                        ))
                    })?,
            };
            let client = ctx.client()?;
            let signature = match signature {
                Some(signature) => signature,
                None => {
                    fetch_signature(&client, module, kind, &name, "pass --signature").await?
                }
            };
            let path = datafile_path(module, kind, &name, &filename);
            let response = {
                let _spinner = ctx.spinner(format!("Uploading {filename}..."));
                client
                    .stream_upload(
                        Method::PUT,
                        &path,
                        &file,
                        &[("signature", signature)],
                        DATAFILE_CONTENT_TYPE,
                    )
                    .await?
            };
            read_body(response).await?;
            println!("Uploaded {} to {resource_type}/{name}/{filename}.", file.display());
            Ok(())
        }
        ResourceCommand::Download {
            resource_type,
            name,
            filename,
            output,
        } => {
            let (module, kind) = split_resource_type(&resource_type)?;
            let dest = output.output.unwrap_or_else(|| PathBuf::from(&filename));
            let client = ctx.client()?;
            let bytes = {
                let _spinner = ctx.spinner(format!("Downloading {filename}..."));
                client
                    .stream_to_file(&datafile_path(module, kind, &name, &filename), &dest)
                    .await?
            };
            println!("Saved {} ({} bytes)", dest.display(), format_bytes(bytes));
            Ok(())
        }
        ResourceCommand::Types => {
            let client = ctx.client()?;
            let spec = client.openapi_spec().await?;
            let types = resource_types(&spec);
            if types.is_empty() {
                println!("No resource types found");
                return Ok(());
            }
            let rows = types.iter().map(|t| vec![t.clone()]).collect();
            let table = TableSpec::rows(["Resource Type"], rows).with_title("Resource Types");
            ctx.emit(&json!(types), &table)
        }
    }
}

async fn find(client: &GatewayClient, module: &str, kind: &str, name: &str) -> Result<Value> {
    let path = format!("/resources/find/{module}/{kind}/{}", encode_segment(name));
    Ok(client.get_json(&path, &[]).await?)
}

/// Looks up the current signature, the optimistic-concurrency token writes need.
async fn fetch_signature(
    client: &GatewayClient,
    module: &str,
    kind: &str,
    name: &str,
    hint: &'static str,
) -> Result<String> {
    let resource = find(client, module, kind, name).await?;
    match resource.get("signature").and_then(Value::as_str) {
        Some(signature) if !signature.is_empty() => Ok(signature.to_string()),
        _ => Err(CommandError::MissingSignature {
            name: name.to_string(),
            hint,
        }
        .into()),
    }
}

fn datafile_path(module: &str, kind: &str, name: &str, filename: &str) -> String {
    format!(
        "/resources/datafile/{module}/{kind}/{}/{}",
        encode_segment(name),
        encode_segment(filename)
    )
}

/// `--config` or `{"name": ...}`; `name` is filled in when the config lacks one.
fn creation_body(name: &str, config: Option<&str>) -> Result<Value> {
    let mut body = match config {
        Some(config) => parse_json_input(config)?,
        None => json!({}),
    };
    if let Value::Object(map) = &mut body {
        map.entry("name").or_insert_with(|| Value::from(name));
    }
    Ok(body)
}

/// Joins array fields (`files`, `data`, ...) with `, ` for the key/value table.
fn flatten_lists(mut resource: Value) -> Value {
    if let Value::Object(map) = &mut resource {
        for value in map.values_mut() {
            if let Value::Array(items) = value {
                let joined = items.iter().map(cell).collect::<Vec<_>>().join(", ");
                *value = Value::from(joined);
            }
        }
    }
    resource
}

/// Prints the gateway's change list when it sent one.
fn print_changes(ctx: &mut CommandContext, result: &Value) -> Result<()> {
    if result.is_null() {
        return Ok(());
    }
    ctx.emit(result, &TableSpec::new())
}

/// `module/type` pairs behind every `resources/list` endpoint in an OpenAPI document.
fn resource_types(spec: &Value) -> Vec<String> {
    let Some(paths) = spec.get("paths").and_then(Value::as_object) else {
        return Vec::new();
    };
    paths
        .keys()
        .filter_map(|path| {
            let (_, rest) = path.split_once(LIST_PATH_MARKER)?;
            let segments: Vec<&str> = rest
                .split('/')
                .filter(|segment| !segment.is_empty() && !segment.starts_with('{'))
                .take(2)
                .collect();
            (segments.len() == 2).then(|| segments.join("/"))
        })
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
