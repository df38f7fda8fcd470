//! Project command handlers.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::{Map, Value, json};
use tracing::info;

use ignition_core::ProjectTransfer;
use ignition_core::client::{encode_segment, extract_items};
use ignition_core::output::{TableSpec, field};
use ignition_core::sync::{project_diff, start_watcher, sync_events};

use super::{CommandError, confirm, format_bytes, require_file};
use crate::app::context::CommandContext;
use crate::cli::ProjectCommand;

pub(crate) async fn run_project_command(
    ctx: &mut CommandContext,
    command: ProjectCommand,
) -> Result<()> {
    let client = ctx.client()?;
    match command {
        ProjectCommand::List { filter } => {
            let mut projects = client
                .get_all_items("/projects/list", &[], &["projects"])
                .await?;
            if let Some(filter) = filter {
                projects.retain(|project| name_matches(project, &filter));
            }
            let rows = projects
                .iter()
                .map(|project| {
                    vec![
                        field(project, "name"),
                        field(project, "title"),
                        field(project, "enabled"),
                        field(project, "state"),
                        last_modified(project),
                    ]
                })
                .collect();
            let spec = TableSpec::rows(["Name", "Title", "Enabled", "State", "Last Modified"], rows)
                .with_title("Projects");
            ctx.emit(&Value::Array(projects), &spec)
        }
        ProjectCommand::Show { name } => {
            let project = client
                .get_json(&format!("/projects/find/{}", encode_segment(&name)), &[])
                .await?;
            ctx.emit(&project, &TableSpec::kv().with_title(format!("Project: {name}")))
        }
        ProjectCommand::Create {
            name,
            title,
            description,
        } => {
            let body = project_body(&name, title, description);
            client.post_json("/projects", Some(body)).await?;
            println!("Project '{name}' created.");
            Ok(())
        }
        ProjectCommand::Delete { name, confirm: force } => {
            if !confirm(&format!("Delete project '{name}'? This cannot be undone"), force)? {
                return Ok(());
            }
            client
                .delete(&format!("/projects/{}", encode_segment(&name)), &[])
                .await?;
            println!("Project '{name}' deleted.");
            Ok(())
        }
        ProjectCommand::Export { name, output } => {
            let dest = export_destination(&name, output.output)?;
            let bytes = {
                let _spinner = ctx.spinner(format!("Exporting project '{name}'..."));
                client.export_project(&name, &dest).await?
            };
            println!(
                "Project '{name}' exported to {} ({} bytes)",
                dest.display(),
                format_bytes(bytes)
            );
            Ok(())
        }
        ProjectCommand::Import {
            file,
            name,
            overwrite,
            confirm: force,
        } => {
            require_file(&file)?;
            let name = match name {
                Some(name) => name,
                None => project_name_from_file(&file)?,
            };
            if overwrite
                && !confirm(
                    &format!("Overwrite project '{name}' with {}?", file.display()),
                    force,
                )?
            {
                return Ok(());
            }
            {
                let _spinner = ctx.spinner(format!("Importing project '{name}'..."));
                client.import_project(&name, &file, overwrite).await?;
            }
            println!("Project '{name}' imported from {}.", file.display());
            Ok(())
        }
        ProjectCommand::Copy { name, new_name } => {
            let body = json!({"fromName": name, "toName": new_name});
            client.post_json("/projects/copy", Some(body)).await?;
            println!("Project '{name}' copied to '{new_name}'.");
            Ok(())
        }
        ProjectCommand::Rename { name, new_name } => {
            let body = json!({"name": new_name});
            client
                .post_json(&format!("/projects/rename/{}", encode_segment(&name)), Some(body))
                .await?;
            println!("Project '{name}' renamed to '{new_name}'.");
            Ok(())
        }
        ProjectCommand::Resources { name } => {
            let project = client
                .get_json(&format!("/projects/find/{}", encode_segment(&name)), &[])
                .await?;
            let resources = extract_items(&project, &["resources"]);
            let rows = resources
                .iter()
                .map(|resource| {
                    vec![
                        field(resource, "name"),
                        field(resource, "type"),
                        field(resource, "path"),
                        field(resource, "scope"),
                    ]
                })
                .collect();
            let spec = TableSpec::rows(["Name", "Type", "Path", "Scope"], rows)
                .with_title(format!("Resources: {name}"));
            ctx.emit(&Value::Array(resources), &spec)
        }
        ProjectCommand::Diff { name, target } => {
            let target_client = ctx.client_for_profile(&target)?;
            let find = format!("/projects/find/{}", encode_segment(&name));
            let (source, destination) = {
                let _spinner = ctx.spinner(format!("Comparing project '{name}'..."));
                tokio::try_join!(client.get_json(&find, &[]), target_client.get_json(&find, &[]))?
            };
            match project_diff(&name, &source, &destination) {
                Some(diff) => print!("{diff}"),
                None => println!("No differences found for project '{name}'."),
            }
            Ok(())
        }
        ProjectCommand::Watch { name, path } => {
            let (_watcher, events) = start_watcher(&path)?;
            println!("Watching {} for changes to project '{name}'...", path.display());
            println!("Press Ctrl+C to stop.");
            tokio::select! {
                summary = sync_events(&client, &name, &path, events) => {
                    info!(synced = summary.synced, failed = summary.failed, "watch ended");
                }
                signal = tokio::signal::ctrl_c() => {
                    signal.context("failed to listen for Ctrl+C")?;
                    println!("Stopped watching.");
                }
            }
            Ok(())
        }
    }
}

fn name_matches(project: &Value, filter: &str) -> bool {
    project
        .get("name")
        .and_then(Value::as_str)
        .is_some_and(|name| name.to_lowercase().contains(&filter.to_lowercase()))
}

fn last_modified(project: &Value) -> String {
    match field(project, "lastModified") {
        value if value.is_empty() => field(project, "last_modified"),
        value => value,
    }
}

fn project_body(name: &str, title: Option<String>, description: Option<String>) -> Value {
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

/// `-o` when given (must not be a directory, parent must exist), else `<name>.zip`.
fn export_destination(name: &str, output: Option<PathBuf>) -> Result<PathBuf, CommandError> {
    let Some(dest) = output else {
        return Ok(PathBuf::from(format!("{name}.zip")));
    };
    if dest.is_dir() {
        return Err(CommandError::Usage(format!(
            "output path {} is a directory; give a file name",
            dest.display()
        )));
    }
    match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.is_dir() => {
            Err(CommandError::Usage(format!(
                "output directory {} does not exist",
                parent.display()
            )))
        }
        _ => Ok(dest),
    }
}

fn project_name_from_file(file: &Path) -> Result<String, CommandError> {
    file.file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            CommandError::Usage(format!(
                "cannot derive a project name from {}; pass --name",
                file.display()
            ))
        })
}
