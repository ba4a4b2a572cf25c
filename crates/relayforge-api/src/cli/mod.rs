//! CLI command definitions and dispatch for the `rforge` binary.
//!
//! Uses clap derive macros for argument parsing. The CLI follows a verb-noun
//! pattern (e.g., `rforge list builds`, `rforge gateway import`).

pub mod build;
pub mod gateway;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use indicatif::{ProgressBar, ProgressStyle};

/// Customize and package relay builds from gateway builds.
#[derive(Parser)]
#[command(name = "rforge", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List resources.
    #[command(alias = "ls")]
    List {
        #[command(subcommand)]
        resource: ListResource,
    },

    /// Show details of a relay build.
    Show {
        /// Relay build id (hex, optional 0x prefix).
        id: String,
    },

    /// Customize a relay build from a JSON request file and save the artifact.
    Customize {
        /// Path to a build request JSON file.
        request: PathBuf,

        /// Directory to write the artifact into.
        #[arg(long, short, default_value = ".")]
        out: PathBuf,
    },

    /// Manage gateway builds.
    Gateway {
        #[command(subcommand)]
        action: GatewayCommand,
    },

    /// Start the REST API server.
    Serve {
        /// Port to listen on.
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum ListResource {
    /// List relay builds, one page at a time.
    Builds {
        /// Page number (1-based).
        #[arg(long, default_value = "1")]
        page: u32,

        /// Builds per page (defaults to the configured page size).
        #[arg(long)]
        per_page: Option<u32>,
    },

    /// List gateway builds.
    Gateways,
}

#[derive(Subcommand)]
pub enum GatewayCommand {
    /// Register a gateway build from a JSON file.
    Import {
        /// Path to a gateway build JSON file.
        file: PathBuf,
    },

    /// Show details of a gateway build.
    Show {
        /// Gateway build id (hex, optional 0x prefix).
        id: String,
    },
}

/// Steady-ticking spinner shared by long-running commands.
pub(crate) fn spinner(message: impl Into<String>) -> Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.set_message(message.into());
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    Ok(spinner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_customize() {
        let cli = Cli::try_parse_from(["rforge", "customize", "req.json", "--out", "dist", "--json"])
            .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Customize { request, out } => {
                assert_eq!(request, PathBuf::from("req.json"));
                assert_eq!(out, PathBuf::from("dist"));
            }
            _ => panic!("expected customize"),
        }
    }

    #[test]
    fn test_parse_list_builds_paging() {
        let cli = Cli::try_parse_from(["rforge", "ls", "builds", "--page", "3", "--per-page", "25"])
            .unwrap();
        match cli.command {
            Commands::List {
                resource: ListResource::Builds { page, per_page },
            } => {
                assert_eq!(page, 3);
                assert_eq!(per_page, Some(25));
            }
            _ => panic!("expected list builds"),
        }
    }
}
