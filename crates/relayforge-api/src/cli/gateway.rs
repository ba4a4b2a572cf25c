//! Gateway build CLI commands: import, list, show.

use std::path::Path;

use anyhow::{Context, Result};
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use console::style;

use relayforge_types::build::GatewayBuild;
use relayforge_types::id::BuildId;

use crate::state::AppState;

/// Register a gateway build from a JSON file.
pub async fn import_gateway(state: &AppState, file: &Path, json: bool) -> Result<()> {
    let content = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
    let build: GatewayBuild = serde_json::from_str(&content)
        .with_context(|| format!("invalid gateway build in {}", file.display()))?;

    let build = state.build_service.import_gateway_build(build).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&build)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Gateway build {} imported (agent {}, {} channel{})",
        style("✓").green().bold(),
        style(build.build_id).cyan(),
        build.agent_id,
        build.channels.len(),
        if build.channels.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

/// List all gateway builds.
pub async fn list_gateways(state: &AppState, json: bool) -> Result<()> {
    let builds = state.build_service.list_gateway_builds().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&builds)?);
        return Ok(());
    }

    if builds.is_empty() {
        println!();
        println!(
            "  {} No gateway builds. Import one with: {}",
            style("i").blue().bold(),
            style("rforge gateway import <gateway.json>").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("ID").fg(Color::White),
        Cell::new("Agent").fg(Color::White),
        Cell::new("Channels").fg(Color::White),
        Cell::new("Commands").fg(Color::White),
        Cell::new("Created").fg(Color::White),
    ]);

    for build in &builds {
        table.add_row(vec![
            Cell::new(build.build_id.to_string()).fg(Color::Cyan),
            Cell::new(build.agent_id.to_string()),
            Cell::new(build.channels.len()),
            Cell::new(build.relay_commands.commands.len()),
            Cell::new(build.created_at.format("%Y-%m-%d %H:%M").to_string()).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();

    Ok(())
}

/// Show one gateway build.
pub async fn show_gateway(state: &AppState, id: &str, json: bool) -> Result<()> {
    let id: BuildId = id.parse()?;
    let build = state.build_service.get_gateway_build(id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&build)?);
        return Ok(());
    }

    println!();
    println!("  {}", style(format!("Gateway {}", build.build_id)).cyan().bold());
    println!();
    println!("  {}       {}", style("Agent:").bold(), build.agent_id);
    println!("  {}    {}", style("Channels:").bold(), build.channels.len());
    println!(
        "  {}    {}",
        style("Commands:").bold(),
        build.relay_commands.commands.len()
    );
    println!(
        "  {}     {}",
        style("Created:").bold(),
        build.created_at.format("%Y-%m-%d %H:%M UTC")
    );
    println!();

    Ok(())
}
