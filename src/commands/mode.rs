//! Deployment mode handlers, including resource assignment to a mode.

use anyhow::Result;
use serde_json::{Map, Value, json};

use ignition_core::GatewayClient;
use ignition_core::client::{encode_segment, extract_items};
use ignition_core::output::{TableSpec, field};

use super::{CommandError, confirm, split_resource_type};
use crate::app::context::CommandContext;
use crate::cli::ModeCommand;

/// Server-managed fields stripped before re-posting a resource into a mode.
const SERVER_FIELDS: &[&str] = &["signature", "state", "resourceCount"];

pub(crate) async fn run_mode_command(ctx: &mut CommandContext, command: ModeCommand) -> Result<()> {
    let client = ctx.client()?;
    match command {
        ModeCommand::List => {
            let modes = list_modes(&client).await?;
            let rows = modes
                .iter()
                .map(|mode| {
                    vec![
                        field(mode, "name"),
                        field(mode, "title"),
                        field(mode, "description"),
                        mode.get("resourceCount")
                            .and_then(Value::as_u64)
                            .unwrap_or(0)
                            .to_string(),
                    ]
                })
                .collect();
            let spec = TableSpec::rows(["Name", "Title", "Description", "Resources"], rows)
                .with_title("Deployment Modes");
            ctx.emit(&Value::Array(modes), &spec)
        }
        ModeCommand::Show { name } => {
            let mode = list_modes(&client)
                .await?
                .into_iter()
                .find(|mode| mode.get("name").and_then(Value::as_str) == Some(name.as_str()))
                .ok_or_else(|| CommandError::NotFound(format!("mode '{name}'")))?;
            ctx.emit(&mode, &TableSpec::kv().with_title(format!("Mode: {name}")))
        }
        ModeCommand::Create {
            name,
            title,
            description,
        } => {
            let body = mode_body(&name, title, description);
            client.post_json("/mode", Some(body)).await?;
            println!("Mode '{name}' created.");
            Ok(())
        }
        ModeCommand::Update {
            name,
            new_name,
            title,
            description,
        } => {
            if new_name.is_none() && title.is_none() && description.is_none() {
                println!("Nothing to update.");
                return Ok(());
            }
            let body = mode_body(new_name.as_deref().unwrap_or(&name), title, description);
            client
                .put_json(&format!("/mode/{}", encode_segment(&name)), Some(body))
                .await?;
            println!("Mode '{name}' updated.");
            Ok(())
        }
        ModeCommand::Delete { name, confirm: force } => {
            if !confirm(&format!("Delete mode '{name}'?"), force)? {
                return Ok(());
            }
            client
                .delete(&format!("/mode/{}", encode_segment(&name)), &[])
                .await?;
            println!("Mode '{name}' deleted.");
            Ok(())
        }
        ModeCommand::Assign {
            mode,
            resource_type,
            name,
        } => {
            let (module, kind) = split_resource_type(&resource_type)?;
            let resource = fetch_resource(&client, module, kind, name.as_deref(), None).await?;
            let body = assignment_body(resource, name.as_deref(), &mode);
            let label = field(&body, "name");
            client
                .post_json(&format!("/resources/{module}/{kind}"), Some(json!([body])))
                .await?;
            println!("Assigned {resource_type}/{label} to mode '{mode}'.");
            Ok(())
        }
        ModeCommand::Unassign {
            mode,
            resource_type,
            name,
        } => {
            let (module, kind) = split_resource_type(&resource_type)?;
            let resource =
                fetch_resource(&client, module, kind, name.as_deref(), Some(&mode)).await?;
            let resource_name = name
                .or_else(|| resource.get("name").and_then(Value::as_str).map(str::to_string))
                .unwrap_or_default();
            let signature = resource
                .get("signature")
                .and_then(Value::as_str)
                .filter(|signature| !signature.is_empty())
                .ok_or_else(|| CommandError::MissingSignature {
                    name: resource_name.clone(),
                    hint: "cannot unassign",
                })?;
            let path = format!(
                "/resources/{module}/{kind}/{}/{}",
                encode_segment(&resource_name),
                encode_segment(signature)
            );
            let query = [("collection", mode.clone()), ("confirm", "true".to_string())];
            client.delete(&path, &query).await?;
            println!("Unassigned {resource_type}/{resource_name} from mode '{mode}'.");
            Ok(())
        }
    }
}

async fn list_modes(client: &GatewayClient) -> Result<Vec<Value>> {
    let body = client.get_json("/mode", &[]).await?;
    Ok(extract_items(&body, &["modes"]))
}

/// Named resources come from `find`, singletons (no name) from `singleton`.
async fn fetch_resource(
    client: &GatewayClient,
    module: &str,
    kind: &str,
    name: Option<&str>,
    collection: Option<&str>,
) -> Result<Value> {
    let path = match name {
        Some(name) => format!("/resources/find/{module}/{kind}/{}", encode_segment(name)),
        None => format!("/resources/singleton/{module}/{kind}"),
    };
    let query: Vec<(&str, String)> = collection
        .map(|mode| ("collection", mode.to_string()))
        .into_iter()
        .collect();
    Ok(client.get_json(&path, &query).await?)
}

fn mode_body(name: &str, title: Option<String>, description: Option<String>) -> Value {
    let mut body = Map::new();
    body.insert("name".to_string(), Value::from(name));
    if let Some(title) = title {
        body.insert("title".to_string(), Value::from(title));
    }
    if let Some(description) = description {
        body.insert("description".to_string(), Value::from(description));
    }
    Value::Object(body)
}

/// The fetched resource re-targeted at `mode`'s collection.
fn assignment_body(resource: Value, name: Option<&str>, mode: &str) -> Value {
    let mut body = match resource {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    for key in SERVER_FIELDS {
        body.remove(*key);
    }
    if let Some(name) = name {
        body.insert("name".to_string(), Value::from(name));
    }
    body.insert("collection".to_string(), Value::from(mode));
    Value::Object(body)
}
