//! Raw API access and OpenAPI discovery.

use std::fs;

use anyhow::{Context, Result};
use reqwest::Method;
use serde_json::{Value, json};

use ignition_core::client::{RequestBody, read_body};
use ignition_core::output::{TableSpec, render_json, truncate_to_width};

use super::parse_json_input;
use crate::app::context::CommandContext;
use crate::cli::ApiCommand;

const SUMMARY_WIDTH: usize = 80;
const HTTP_METHODS: &[&str] = &["get", "post", "put", "patch", "delete", "head", "options"];

/// One operation listed by `api discover`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Endpoint {
    method: String,
    path: String,
    summary: String,
}

pub(crate) async fn run_api_command(ctx: &mut CommandContext, command: ApiCommand) -> Result<()> {
    let client = ctx.client()?;
    match command {
        ApiCommand::Get { path } => {
            let response = client
                .request(Method::GET, &path, &[], RequestBody::Empty)
                .await?;
            emit_body(ctx, read_body(response).await?)
        }
        ApiCommand::Post { path, data } => {
            let body = json_body(data.as_deref())?;
            let response = client.request(Method::POST, &path, &[], body).await?;
            emit_body(ctx, read_body(response).await?)
        }
        ApiCommand::Put { path, data } => {
            let body = json_body(data.as_deref())?;
            let response = client.request(Method::PUT, &path, &[], body).await?;
            emit_body(ctx, read_body(response).await?)
        }
        ApiCommand::Delete { path } => {
            let response = client
                .request(Method::DELETE, &path, &[], RequestBody::Empty)
                .await?;
            match read_body(response).await? {
                Value::Null => {
                    println!("Deleted.");
                    Ok(())
                }
                other => emit_body(ctx, other),
            }
        }
        ApiCommand::Discover { filter, method } => {
            let spec = client.openapi_spec().await?;
            let endpoints = discover(&spec, filter.as_deref(), method.as_deref());
            let rows = endpoints
                .iter()
                .map(|endpoint| {
                    vec![
                        endpoint.method.clone(),
                        endpoint.path.clone(),
                        endpoint.summary.clone(),
                    ]
                })
                .collect();
            let data = endpoints
                .iter()
                .map(|endpoint| {
                    json!({
                        "method": endpoint.method,
                        "path": endpoint.path,
                        "summary": endpoint.summary,
                    })
                })
                .collect();
            let table = TableSpec::rows(["Method", "Path", "Summary"], rows)
                .with_title("API Endpoints");
            ctx.emit(&Value::Array(data), &table)?;
            println!("{} endpoints found", endpoints.len());
            Ok(())
        }
        ApiCommand::Spec(output) => {
            let spec = client.openapi_spec().await?;
            let text = render_json(&spec)?;
            match output.output {
                Some(dest) => {
                    fs::write(&dest, format!("{text}\n"))
                        .with_context(|| format!("failed to write {}", dest.display()))?;
                    println!("OpenAPI spec saved to {}", dest.display());
                }
                None => println!("{text}"),
            }
            Ok(())
        }
    }
}

fn json_body(data: Option<&str>) -> Result<RequestBody> {
    Ok(match data {
        Some(data) => RequestBody::Json(parse_json_input(data)?),
        None => RequestBody::Empty,
    })
}

fn emit_body(ctx: &mut CommandContext, body: Value) -> Result<()> {
    let spec = if body.is_object() {
        TableSpec::kv()
    } else {
        TableSpec::new()
    };
    ctx.emit(&body, &spec)
}

/// Every operation in an OpenAPI document, sorted by path then method order.
///
/// `filter` matches the path or summary case-insensitively; `method` matches
/// the HTTP verb exactly (any case).
fn discover(spec: &Value, filter: Option<&str>, method: Option<&str>) -> Vec<Endpoint> {
    let Some(paths) = spec.get("paths").and_then(Value::as_object) else {
        return Vec::new();
    };
    let filter = filter.map(str::to_lowercase);
    let method = method.map(str::to_lowercase);

    let mut sorted: Vec<_> = paths.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let mut endpoints = Vec::new();
    for (path, item) in sorted {
        let Some(operations) = item.as_object() else {
            continue;
        };
        for verb in HTTP_METHODS {
            let Some(operation) = operations.get(*verb) else {
                continue;
            };
            if method.as_deref().is_some_and(|wanted| wanted != *verb) {
                continue;
            }
            let summary = operation
                .get("summary")
                .or_else(|| operation.get("description"))
                .and_then(Value::as_str)
                .unwrap_or_default();
            let matches_filter = filter.as_deref().is_none_or(|filter| {
                path.to_lowercase().contains(filter) || summary.to_lowercase().contains(filter)
            });
            if !matches_filter {
                continue;
            }
            endpoints.push(Endpoint {
                method: verb.to_uppercase(),
                path: path.clone(),
                summary: truncate_to_width(
                    summary.lines().next().unwrap_or_default(),
                    SUMMARY_WIDTH,
                ),
            });
        }
    }
    endpoints
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample_spec() -> Value {
        json!({
            "openapi": "3.0.1",
            "paths": {
                "/data/api/v1/projects/list": {
                    "get": {"summary": "List projects"},
                    "x-internal": true
                },
                "/data/api/v1/gateway-info": {
                    "get": {"description": "Gateway information\nwith details"}
                },
                "/data/api/v1/projects/{name}": {
                    "delete": {"summary": "Delete a project"},
                    "parameters": []
                }
            }
        })
    }

    #[test]
    fn test_discover_sorts_and_skips_non_operations() {
        let endpoints = discover(&sample_spec(), None, None);
        let listed: Vec<_> = endpoints
            .iter()
            .map(|e| format!("{} {}", e.method, e.path))
            .collect();
        assert_eq!(
            listed,
            [
                "GET /data/api/v1/gateway-info",
                "GET /data/api/v1/projects/list",
                "DELETE /data/api/v1/projects/{name}",
            ]
        );
        assert_eq!(endpoints[0].summary, "Gateway information");
    }

    #[test]
    fn test_discover_filters() {
        let by_text = discover(&sample_spec(), Some("PROJECT"), None);
        assert_eq!(by_text.len(), 2);

        let by_method = discover(&sample_spec(), Some("project"), Some("delete"));
        assert_eq!(by_method.len(), 1);
        assert_eq!(by_method[0].summary, "Delete a project");
    }

    #[test]
    fn test_json_body() {
        assert!(matches!(json_body(None).unwrap(), RequestBody::Empty));
        assert!(matches!(
            json_body(Some(r#"{"a": 1}"#)).unwrap(),
            RequestBody::Json(value) if value == json!({"a": 1})
        ));
        assert!(json_body(Some("{bad")).is_err());
    }
}
