//! Device connection handlers (OPC UA devices by default).

use std::time::Duration;

use anyhow::Result;
use serde_json::{Value, json};
use tracing::info;

use ignition_core::client::encode_segment;
use ignition_core::output::{TableSpec, cell, field};

use super::CommandError;
use crate::app::context::CommandContext;
use crate::cli::DeviceCommand;

const RESTART_PAUSE: Duration = Duration::from_secs(1);

pub(crate) async fn run_device_command(
    ctx: &mut CommandContext,
    command: DeviceCommand,
) -> Result<()> {
    let client = ctx.client()?;
    match command {
        DeviceCommand::List { status, target } => {
            let path = format!("/resources/list/{}/{}", target.module, target.device_type);
            let mut devices = client.get_all_items(&path, &[], &["resources"]).await?;
            if let Some(status) = status {
                devices.retain(|device| state_matches(device, &status));
            }
            let rows = devices
                .iter()
                .map(|device| {
                    vec![
                        field(device, "name"),
                        device
                            .pointer("/config/profile/type")
                            .map(cell)
                            .unwrap_or_else(|| field(device, "type")),
                        field(device, "enabled"),
                        field(device, "state"),
                        device
                            .pointer("/config/settings/hostname")
                            .map(cell)
                            .unwrap_or_default(),
                    ]
                })
                .collect();
            let spec = TableSpec::rows(["Name", "Type", "Enabled", "State", "Hostname"], rows)
                .with_title("Device Connections");
            ctx.emit(&Value::Array(devices), &spec)
        }
        DeviceCommand::Show { name, target } => {
            let path = format!(
                "/resources/find/{}/{}/{}",
                target.module,
                target.device_type,
                encode_segment(&name)
            );
            let device = client.get_json(&path, &[]).await?;
            ctx.emit(&device, &TableSpec::kv().with_title(format!("Device: {name}")))
        }
        DeviceCommand::Restart { name, target } => {
            let find = format!(
                "/resources/find/{}/{}/{}",
                target.module,
                target.device_type,
                encode_segment(&name)
            );
            let device = client.get_json(&find, &[]).await?;
            if !device.is_object() {
                return Err(CommandError::NotFound(format!("device '{name}'")).into());
            }
            let update = format!("/resources/{}/{}", target.module, target.device_type);

            {
                let _spinner = ctx.spinner(format!("Restarting device '{name}'..."));
                client
                    .put_json(&update, Some(json!([with_enabled(&device, false)])))
                    .await?;
                info!(device = %name, "device disabled");
                tokio::time::sleep(RESTART_PAUSE).await;
                client
                    .put_json(&update, Some(json!([with_enabled(&device, true)])))
                    .await?;
                info!(device = %name, "device re-enabled");
            }

            println!("Device '{name}' restarted.");
            Ok(())
        }
    }
}

fn state_matches(device: &Value, status: &str) -> bool {
    field(device, "state")
        .to_lowercase()
        .contains(&status.to_lowercase())
}

fn with_enabled(device: &Value, enabled: bool) -> Value {
    let mut copy = device.clone();
    if let Value::Object(map) = &mut copy {
        map.insert("enabled".to_string(), Value::Bool(enabled));
    }
    copy
}
