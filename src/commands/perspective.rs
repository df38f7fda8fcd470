//! Perspective command handlers.
//!
//! Every command here goes through a project export. Reads open the archive
//! in place; writes run one full round trip (export, edit the extracted tree,
//! repack, import with overwrite).

use anyhow::Result;
use serde_json::{Value, json};

use ignition_core::archive::{ArchiveError, with_mutable_project, with_project_archive};
use ignition_core::output::{TableSpec, TreeNode, render_tree};
use ignition_core::perspective::{
    ResourceKind, create_resource, delete_resource, list_ids, page_routes, update_resource,
};
use ignition_core::{GatewayClient, OutputFormat};

use super::{confirm, parse_json_input};
use crate::app::context::CommandContext;
use crate::cli::{
    JsonPayloadArgs, PageCommand, PerspectiveCommand, SessionCommand, StyleCommand, ViewCommand,
};

pub(crate) async fn run_perspective_command(
    ctx: &mut CommandContext,
    command: PerspectiveCommand,
) -> Result<()> {
    match command {
        PerspectiveCommand::View { command } => run_view(ctx, command).await,
        PerspectiveCommand::Page { command } => run_page(ctx, command).await,
        PerspectiveCommand::Style { command } => run_style(ctx, command).await,
        PerspectiveCommand::Session { command } => run_session(ctx, command).await,
    }
}

async fn run_view(ctx: &mut CommandContext, command: ViewCommand) -> Result<()> {
    let kind = ResourceKind::View;
    match command {
        ViewCommand::List { project } => {
            list(ctx, &project, kind, "View Path", &format!("Views: {project}")).await
        }
        ViewCommand::Show { project, view } => {
            show(ctx, &project, kind, Some(&view), &format!("View: {view}")).await
        }
        ViewCommand::Create {
            project,
            view,
            payload,
        } => apply(ctx, &project, kind, Some(&view), Edit::Create(payload)).await,
        ViewCommand::Update {
            project,
            view,
            payload,
        } => apply(ctx, &project, kind, Some(&view), Edit::Update(payload)).await,
        ViewCommand::Delete {
            project,
            view,
            confirm: force,
        } => {
            kind.entry_path(Some(&view))?;
            if !confirm(&format!("Delete view '{view}' from project '{project}'?"), force)? {
                return Ok(());
            }
            apply(ctx, &project, kind, Some(&view), Edit::Delete).await
        }
        ViewCommand::Tree { project } => {
            let client = ctx.client()?;
            let views = {
                let _spinner = ctx.spinner(format!("Exporting project '{project}'..."));
                with_project_archive(&client, &project, |archive| {
                    Ok::<_, ArchiveError>(list_ids(archive, kind))
                })
                .await?
            };
            if ctx.output_format(OutputFormat::Table) == OutputFormat::Table {
                let nodes = TreeNode::from_paths(&views);
                println!("{}", render_tree(&format!("{project} views"), &nodes));
                Ok(())
            } else {
                ctx.emit(&json!(views), &TableSpec::new())
            }
        }
    }
}

async fn run_page(ctx: &mut CommandContext, command: PageCommand) -> Result<()> {
    let kind = ResourceKind::PageConfig;
    match command {
        PageCommand::Show { project } => {
            show(ctx, &project, kind, None, &format!("Page Config: {project}")).await
        }
        PageCommand::List { project } => {
            let config = read(ctx, &project, kind, None).await?;
            let routes = page_routes(&config);
            let rows = routes
                .iter()
                .map(|page| vec![page.route.clone(), page.view_path.clone()])
                .collect();
            let data = routes
                .iter()
                .map(|page| json!({"route": page.route, "viewPath": page.view_path}))
                .collect();
            let spec = TableSpec::rows(["Route", "View Path"], rows)
                .with_title(format!("Pages: {project}"));
            ctx.emit(&Value::Array(data), &spec)
        }
        PageCommand::Update { project, payload } => {
            apply(ctx, &project, kind, None, Edit::Update(payload)).await
        }
    }
}

async fn run_style(ctx: &mut CommandContext, command: StyleCommand) -> Result<()> {
    let kind = ResourceKind::StyleClass;
    match command {
        StyleCommand::List { project } => {
            list(ctx, &project, kind, "Name", &format!("Style Classes: {project}")).await
        }
        StyleCommand::Show { project, style } => {
            show(ctx, &project, kind, Some(&style), &format!("Style Class: {style}")).await
        }
        StyleCommand::Create {
            project,
            style,
            payload,
        } => apply(ctx, &project, kind, Some(&style), Edit::Create(payload)).await,
        StyleCommand::Update {
            project,
            style,
            payload,
        } => apply(ctx, &project, kind, Some(&style), Edit::Update(payload)).await,
        StyleCommand::Delete {
            project,
            style,
            confirm: force,
        } => {
            kind.entry_path(Some(&style))?;
            let prompt = format!("Delete style class '{style}' from project '{project}'?");
            if !confirm(&prompt, force)? {
                return Ok(());
            }
            apply(ctx, &project, kind, Some(&style), Edit::Delete).await
        }
    }
}

async fn run_session(ctx: &mut CommandContext, command: SessionCommand) -> Result<()> {
    let kind = ResourceKind::SessionProps;
    match command {
        SessionCommand::Show { project } => {
            show(ctx, &project, kind, None, &format!("Session Props: {project}")).await
        }
        SessionCommand::Update { project, payload } => {
            apply(ctx, &project, kind, None, Edit::Update(payload)).await
        }
    }
}

async fn list(
    ctx: &mut CommandContext,
    project: &str,
    kind: ResourceKind,
    column: &str,
    title: &str,
) -> Result<()> {
    let client = ctx.client()?;
    let ids = {
        let _spinner = ctx.spinner(format!("Exporting project '{project}'..."));
        with_project_archive(&client, project, |archive| {
            Ok::<_, ArchiveError>(list_ids(archive, kind))
        })
        .await?
    };
    let rows = ids.iter().map(|id| vec![id.clone()]).collect();
    let spec = TableSpec::rows([column], rows).with_title(title);
    ctx.emit(&json!(ids), &spec)
}

async fn show(
    ctx: &mut CommandContext,
    project: &str,
    kind: ResourceKind,
    id: Option<&str>,
    title: &str,
) -> Result<()> {
    let payload = read(ctx, project, kind, id).await?;
    ctx.emit(&payload, &TableSpec::kv().with_title(title))
}

async fn read(
    ctx: &mut CommandContext,
    project: &str,
    kind: ResourceKind,
    id: Option<&str>,
) -> Result<Value> {
    let entry = kind.entry_path(id)?;
    let client = ctx.client()?;
    let _spinner = ctx.spinner(format!("Exporting project '{project}'..."));
    Ok(with_project_archive(&client, project, |archive| archive.read_json(&entry)).await?)
}

/// A write against one resource.
enum Edit {
    Create(JsonPayloadArgs),
    Update(JsonPayloadArgs),
    Delete,
}

impl Edit {
    fn verb(&self) -> &'static str {
        match self {
            Self::Create(_) => "created",
            Self::Update(_) => "updated",
            Self::Delete => "deleted",
        }
    }
}

/// Validates input locally, then runs the round trip.
///
/// The identifier and the JSON payload are checked before anything is
/// exported, so bad input never reaches the gateway.
async fn apply(
    ctx: &mut CommandContext,
    project: &str,
    kind: ResourceKind,
    id: Option<&str>,
    edit: Edit,
) -> Result<()> {
    kind.entry_path(id)?;
    let payload = match &edit {
        Edit::Create(args) | Edit::Update(args) => Some(parse_json_input(&args.json)?),
        Edit::Delete => None,
    };

    let client = ctx.client()?;
    {
        let _spinner = ctx.spinner(format!("Updating project '{project}'..."));
        mutate(&client, project, kind, id, &edit, payload.as_ref()).await?;
    }
    println!("{}", edit_message(kind, id, project, edit.verb()));
    Ok(())
}

async fn mutate(
    client: &GatewayClient,
    project: &str,
    kind: ResourceKind,
    id: Option<&str>,
    edit: &Edit,
    payload: Option<&Value>,
) -> Result<(), ArchiveError> {
    let empty = Value::Null;
    let payload = payload.unwrap_or(&empty);
    with_mutable_project(client, project, |root| match edit {
        Edit::Create(_) => create_resource(root, kind, id, payload),
        Edit::Update(_) => update_resource(root, kind, id, payload),
        Edit::Delete => delete_resource(root, kind, id.unwrap_or_default()),
    })
    .await
}

fn edit_message(kind: ResourceKind, id: Option<&str>, project: &str, verb: &str) -> String {
    let mut subject = kind.describe(id);
    if let Some(first) = subject.get_mut(..1) {
        first.make_ascii_uppercase();
    }
    let preposition = if verb == "deleted" { "from" } else { "in" };
    format!("{subject} {verb} {preposition} project '{project}'.")
}
