//! CLI for the starnode monitoring-stack installer.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use starnode_core::config::{self, StarnodeConfig};
use starnode_core::control::ControlCommand;
use std::path::{Path, PathBuf};

use commands::{run_checksum, run_completions, run_control, run_install, run_verify};

/// Top-level CLI for starnode.
#[derive(Debug, Parser)]
#[command(name = "starnode")]
#[command(about = "starnode: install and control a Prometheus + Node Exporter stack", long_about = None)]
pub struct Cli {
    /// Config file to use instead of ~/.config/starnode/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download, verify and install the stack, then start its services.
    Install {
        /// Always download, even if a verified archive is already cached.
        #[arg(long)]
        no_reuse: bool,
        /// Install binaries only; do not write service definitions or start anything.
        #[arg(long)]
        skip_services: bool,
    },

    /// Start all services.
    Start,

    /// Stop all services.
    Stop,

    /// Restart all services.
    Restart,

    /// Show service status.
    Status,

    /// Stop services and remove binaries, data, configuration and service definitions.
    Uninstall,

    /// Compute SHA-256 of a file, printed as a manifest line.
    Checksum {
        /// Path to the file.
        path: PathBuf,
    },

    /// Verify a file against a local checksum manifest.
    Verify {
        /// File to check.
        file: PathBuf,
        /// Manifest with `<sha256>  <filename>` lines.
        #[arg(long, value_name = "PATH")]
        manifest: PathBuf,
        /// Name to look up in the manifest (default: the file's name).
        #[arg(long)]
        name: Option<String>,
    },

    /// Print a shell completion script.
    Completions {
        shell: Shell,
    },
}

impl CliCommand {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let config_path = cli.config.as_deref();

        match cli.command {
            CliCommand::Checksum { path } => run_checksum(&path),
            CliCommand::Verify {
                file,
                manifest,
                name,
            } => run_verify(&file, &manifest, name.as_deref()),
            CliCommand::Completions { shell } => run_completions(shell),
            CliCommand::Install {
                no_reuse,
                skip_services,
            } => run_install(&load_config(config_path)?, !no_reuse, skip_services),
            CliCommand::Start => run_control(&load_config(config_path)?, ControlCommand::Start),
            CliCommand::Stop => run_control(&load_config(config_path)?, ControlCommand::Stop),
            CliCommand::Restart => run_control(&load_config(config_path)?, ControlCommand::Restart),
            CliCommand::Status => run_control(&load_config(config_path)?, ControlCommand::Status),
            CliCommand::Uninstall => {
                run_control(&load_config(config_path)?, ControlCommand::Uninstall)
            }
        }
    }
}

fn load_config(explicit: Option<&Path>) -> Result<StarnodeConfig> {
    let cfg = match explicit {
        Some(path) => config::load_from(path)?,
        None => config::load_or_init()?,
    };
    tracing::debug!("loaded config: {:?}", cfg);
    Ok(cfg)
}

#[cfg(test)]
mod tests;
