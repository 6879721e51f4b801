//! CLI definition and command handling

pub mod commands;
mod context;
pub mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::{
    BackupCommand, CompletionsCommand, GenerateCommand, ServiceCommand, SignCommand,
    WipeAllConfigsCommand, WipeLogsCommand,
};

/// teamca - short-lived SSH certificates for team members
#[derive(Debug, Parser)]
#[command(name = "teamca")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Configuration file (teamca.toml or teamca.yaml)
    #[arg(short, long, global = true, env = "TEAMCA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for CLI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output
    Json,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the CA private key for backup
    Backup(BackupCommand),

    /// Generate a new CA key
    Generate(GenerateCommand),

    /// Run the CA signing service until stopped
    Service(ServiceCommand),

    /// Sign a public key offline
    Sign(SignCommand),

    /// Generate shell completions
    Completions(CompletionsCommand),

    /// Delete stray client configs from every visible team
    #[command(hide = true)]
    WipeAllConfigs(WipeAllConfigsCommand),

    /// Delete the CA log file
    #[command(hide = true)]
    WipeLogs(WipeLogsCommand),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(&self) -> anyhow::Result<()> {
        match &self.command {
            Commands::Backup(cmd) => cmd.execute(self),
            Commands::Generate(cmd) => cmd.execute(self),
            Commands::Service(cmd) => cmd.execute(self),
            Commands::Sign(cmd) => cmd.execute(self),
            Commands::Completions(cmd) => cmd.execute(self),
            Commands::WipeAllConfigs(cmd) => cmd.execute(self),
            Commands::WipeLogs(cmd) => cmd.execute(self),
        }
    }
}
