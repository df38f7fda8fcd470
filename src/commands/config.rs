//! Config command handlers: manage gateway profiles.

use std::io::{self, BufRead, Write};

use anyhow::Result;
use serde_json::{Map, Value, json};

use ignition_core::client::constants::DEFAULT_TIMEOUT_SECS;
use ignition_core::config::{ConfigError, ConnectionFlags, GatewayProfile};
use ignition_core::output::TableSpec;

use super::{CommandError, confirm};
use crate::app::context::CommandContext;
use crate::cli::ConfigCommand;

const MASKED: &str = "***";
const TOKEN_VISIBLE_CHARS: usize = 8;

pub(crate) async fn run_config_command(
    ctx: &mut CommandContext,
    command: ConfigCommand,
) -> Result<()> {
    match command {
        ConfigCommand::Init => init(ctx),
        ConfigCommand::Add {
            name,
            username,
            password,
            no_verify_ssl,
            timeout,
            default,
        } => {
            let url = ctx.flags().url.clone().ok_or_else(|| {
                CommandError::Usage("--url is required for 'config add'".to_string())
            })?;
            let profile = GatewayProfile {
                url: url.trim_end_matches('/').to_string(),
                token: ctx.flags().token.clone(),
                username,
                password,
                verify_ssl: !no_verify_ssl,
                timeout_secs: timeout.unwrap_or(DEFAULT_TIMEOUT_SECS),
            };
            add(ctx, &name, profile, default)
        }
        ConfigCommand::List => list(ctx),
        ConfigCommand::Show { name } => show(ctx, &name),
        ConfigCommand::SetDefault { name } => {
            let store = ctx.store()?;
            store.set_default(&name)?;
            store.save()?;
            println!("Default profile set to '{name}'.");
            Ok(())
        }
        ConfigCommand::Test { name } => test_connection(ctx, name).await,
        ConfigCommand::Remove { name, confirm: force } => {
            if ctx.store()?.profile(&name).is_none() {
                return Err(ConfigError::profile_not_found(name).into());
            }
            if !confirm(&format!("Remove profile '{name}'?"), force)? {
                return Ok(());
            }
            let store = ctx.store()?;
            store.remove_profile(&name);
            store.save()?;
            println!("Profile '{name}' removed.");
            Ok(())
        }
    }
}

fn init(ctx: &mut CommandContext) -> Result<()> {
    println!("Ignition CLI setup\n");
    let name = prompt("Profile name", Some("default"))?;
    let url = prompt("Gateway URL (e.g. https://gateway:8043)", None)?;
    if url.is_empty() {
        return Err(CommandError::Usage("a gateway URL is required".to_string()).into());
    }
    let token = prompt("API token (keyId:secretKey, blank for none)", Some(""))?;
    let verify = prompt("Verify SSL certificates? [Y/n]", Some("y"))?;

    let mut profile = GatewayProfile::new(url.trim_end_matches('/'));
    profile.token = Some(token).filter(|t| !t.is_empty());
    profile.verify_ssl = !matches!(verify.to_ascii_lowercase().as_str(), "n" | "no");

    let store = ctx.store()?;
    store.add_profile(name.as_str(), profile)?;
    store.set_default(&name)?;
    store.save()?;
    println!("\nProfile '{name}' saved and set as default.");
    println!("Config file: {}", store.path().display());
    Ok(())
}

fn prompt(label: &str, default: Option<&str>) -> Result<String> {
    let mut stdout = io::stdout();
    match default {
        Some(value) if !value.is_empty() => write!(stdout, "{label} [{value}]: ")?,
        _ => write!(stdout, "{label}: ")?,
    }
    stdout.flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    let answer = answer.trim();
    Ok(if answer.is_empty() {
        default.unwrap_or_default().to_string()
    } else {
        answer.to_string()
    })
}

fn add(
    ctx: &mut CommandContext,
    name: &str,
    profile: GatewayProfile,
    make_default: bool,
) -> Result<()> {
    let store = ctx.store()?;
    let replaced = store.add_profile(name, profile)?;
    if make_default {
        store.set_default(name)?;
    }
    store.save()?;
    let verb = if replaced { "updated" } else { "added" };
    println!("Profile '{name}' {verb}.");
    Ok(())
}

fn list(ctx: &mut CommandContext) -> Result<()> {
    let store = ctx.store()?;
    if store.config().profiles.is_empty() {
        println!("No profiles configured. Run 'ignition-cli config init' to get started.");
        return Ok(());
    }

    let default = store.default_profile().map(str::to_string);
    let mut rows = Vec::new();
    let mut items = Vec::new();
    for (name, profile) in store.profiles() {
        let is_default = default.as_deref() == Some(name);
        rows.push(vec![
            name.to_string(),
            profile.url.clone(),
            auth_label(profile).to_string(),
            if is_default { "*" } else { "" }.to_string(),
        ]);
        items.push(json!({
            "name": name,
            "url": profile.url,
            "auth": auth_label(profile),
            "default": is_default,
        }));
    }

    let spec = TableSpec::rows(["Name", "URL", "Auth", "Default"], rows).with_title("Gateway Profiles");
    ctx.emit(&Value::Array(items), &spec)
}

fn show(ctx: &mut CommandContext, name: &str) -> Result<()> {
    let profile = ctx
        .store()?
        .profile(name)
        .cloned()
        .ok_or_else(|| ConfigError::profile_not_found(name))?;
    let data = masked_profile(name, &profile)?;
    ctx.emit(&data, &TableSpec::kv().with_title(format!("Profile: {name}")))
}

async fn test_connection(ctx: &mut CommandContext, name: Option<String>) -> Result<()> {
    let flags = ConnectionFlags {
        profile: name.or_else(|| ctx.flags().profile.clone()),
        ..ctx.flags().clone()
    };
    let client = ctx.client_with(&flags)?;
    println!("Testing connection to {}...", client.gateway_url());

    let info = client.get_json("/gateway-info", &[]).await?;
    let gateway_name = info.get("name").and_then(Value::as_str).unwrap_or("Unknown");
    let version = info
        .get("ignitionVersion")
        .or_else(|| info.get("version"))
        .and_then(Value::as_str)
        .unwrap_or("?");
    println!("Connected! Gateway: {gateway_name} v{version}");
    Ok(())
}

fn auth_label(profile: &GatewayProfile) -> &'static str {
    if profile.token.is_some() {
        "token"
    } else if profile.username.is_some() {
        "basic"
    } else {
        "none"
    }
}

fn masked_profile(name: &str, profile: &GatewayProfile) -> Result<Value> {
    let mut data = Map::new();
    data.insert("name".to_string(), Value::from(name));
    if let Value::Object(fields) = serde_json::to_value(profile)? {
        data.extend(fields);
    }
    if let Some(Value::String(token)) = data.get_mut("token") {
        *token = mask_token(token);
    }
    if let Some(password) = data.get_mut("password") {
        *password = Value::from(MASKED);
    }
    Ok(Value::Object(data))
}

fn mask_token(token: &str) -> String {
    if token.chars().count() > TOKEN_VISIBLE_CHARS {
        let visible: String = token.chars().take(TOKEN_VISIBLE_CHARS).collect();
        format!("{visible}...")
    } else {
        MASKED.to_string()
    }
}
