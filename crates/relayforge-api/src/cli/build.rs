//! Relay build CLI commands: list, show, customize.

use std::path::Path;

use anyhow::{Context, Result};
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};
use console::style;

use relayforge_core::repository::PageRequest;
use relayforge_infra::filesystem::write_artifact;
use relayforge_types::build::{BinaryType, BuildRequest, RelayBuild};
use relayforge_types::id::BuildId;

use crate::state::AppState;

/// List relay builds in a table, one page at a time.
pub async fn list_builds(
    state: &AppState,
    page: u32,
    per_page: Option<u32>,
    json: bool,
) -> Result<()> {
    let per_page = per_page
        .unwrap_or(state.config.default_per_page)
        .min(state.config.max_per_page);
    let page = state
        .build_service
        .list_relay_builds(PageRequest::new(page, per_page)?)
        .await?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "builds": page.items,
                "page": page.page,
                "perPage": page.per_page,
                "total": page.total,
            }))?
        );
        return Ok(());
    }

    if page.items.is_empty() {
        println!();
        if page.total == 0 {
            println!(
                "  {} No relay builds yet. Create one with: {}",
                style("i").blue().bold(),
                style("rforge customize <request.json>").yellow()
            );
        } else {
            println!(
                "  {} Page {} is past the end ({} builds).",
                style("i").blue().bold(),
                page.page,
                page.total
            );
        }
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("ID").fg(Color::White),
        Cell::new("Name").fg(Color::White),
        Cell::new("Arch").fg(Color::White),
        Cell::new("Type").fg(Color::White),
        Cell::new("Parent Agent").fg(Color::White),
        Cell::new("Created").fg(Color::White),
    ]);

    for build in &page.items {
        table.add_row(vec![
            Cell::new(build.build_id.to_string()).fg(Color::Cyan),
            Cell::new(build.name.as_deref().unwrap_or("-")),
            Cell::new(build.arch.to_string()),
            type_cell(build.binary_type),
            Cell::new(build.parent_gateway_agent_id.to_string()).fg(Color::DarkGrey),
            Cell::new(build.created_at.format("%Y-%m-%d %H:%M").to_string()).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} build{} total, page {} of {}",
        style(page.total).bold(),
        if page.total == 1 { "" } else { "s" },
        page.page,
        page.total_pages()
    );
    println!();

    Ok(())
}

/// Show full details for a relay build.
pub async fn show_build(state: &AppState, id: &str, json: bool) -> Result<()> {
    let id: BuildId = id.parse()?;
    let build = state
        .build_service
        .get_relay_build(i64::from(id.value()))
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&build)?);
        return Ok(());
    }

    print_build(&build);
    Ok(())
}

/// Customize a relay build from a request file and write the artifact.
pub async fn customize(state: &AppState, request: &Path, out: &Path, json: bool) -> Result<()> {
    let content = tokio::fs::read_to_string(request)
        .await
        .with_context(|| format!("failed to read {}", request.display()))?;
    let request: BuildRequest = serde_json::from_str(&content)
        .with_context(|| format!("invalid build request in {}", request.display()))?;

    let spinner = super::spinner(format!(
        "Customizing {} {} relay from gateway build {}...",
        request.architecture, request.binary_type, request.parent_gateway_build_id
    ))?;

    let result = state.build_service.customize(request).await;
    spinner.finish_and_clear();
    let artifact = result?;

    let path = write_artifact(out, &artifact.file_name, &artifact.payload)
        .await
        .with_context(|| format!("failed to write artifact to {}", out.display()))?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "build": artifact.build,
                "fileName": artifact.file_name,
                "path": path.display().to_string(),
                "size": artifact.payload.len(),
            }))?
        );
        return Ok(());
    }

    println!();
    println!(
        "  {} Relay build {} created",
        style("✓").green().bold(),
        style(artifact.build.build_id).cyan()
    );
    println!(
        "  {}  {} ({} bytes)",
        style("Artifact:").bold(),
        path.display(),
        artifact.payload.len()
    );
    println!();

    Ok(())
}

fn type_cell(binary_type: BinaryType) -> Cell {
    match binary_type {
        BinaryType::Exe => Cell::new("exe").fg(Color::Green),
        BinaryType::Dll => Cell::new("dll").fg(Color::Blue),
        BinaryType::Shellcode => Cell::new("shellcode").fg(Color::Magenta),
    }
}

fn print_build(build: &RelayBuild) {
    println!();
    println!(
        "  {} {}",
        style(format!("Relay {}", build.build_id)).cyan().bold(),
        style(build.name.as_deref().unwrap_or("(unnamed)")).dim()
    );
    println!();

    println!("  {}", style("── Details ──").dim());
    println!("  {}          {}", style("Arch:").bold(), build.arch);
    println!("  {}          {}", style("Type:").bold(), build.binary_type);
    println!(
        "  {}  {}",
        style("Parent agent:").bold(),
        build.parent_gateway_agent_id
    );
    println!(
        "  {}       {}",
        style("Created:").bold(),
        build.created_at.format("%Y-%m-%d %H:%M UTC")
    );
    println!();

    println!("  {}", style("── Channels ──").dim());
    if build.channels.is_empty() {
        println!("  {}", style("(none)").dim());
    }
    for channel in &build.channels {
        let mut flags = Vec::new();
        if channel.is_return_channel {
            flags.push("return");
        }
        if channel.is_negotiation_channel {
            flags.push("negotiation");
        }
        println!(
            "  {} iid {:x}  type {}  {}",
            style("•").dim(),
            channel.interface_id,
            channel.hash,
            style(flags.join(", ")).dim()
        );
    }
    println!();

    println!("  {}", style("── Configuration ──").dim());
    println!(
        "  {}  {}",
        style("Startup commands:").bold(),
        build.startup_commands.len()
    );
    println!("  {}          {}", style("Commands:").bold(), build.commands.len());
    println!();
}
