//! Backup command

use std::io::{BufRead, IsTerminal};

use anyhow::Context as _;
use clap::Args;
use dialoguer::Input;
use teamca_signing::{CaKeyManager, SigningError, BACKUP_CONFIRMATION};
use tracing::info;

use crate::cli::context::Context;
use crate::cli::{output, Cli, OutputFormat};

/// Print the CA private key after an explicit confirmation
#[derive(Debug, Args)]
pub struct BackupCommand {}

impl BackupCommand {
    /// Execute the backup command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!("executing backup command");
        let runtime = tokio::runtime::Runtime::new()?;
        let ctx = runtime.block_on(Context::online(cli))?;

        output::warning(
            "This prints the CA private key. Anyone holding it can issue certificates for your teams.",
        );
        let response = read_confirmation()?;

        let manager = CaKeyManager::new(&ctx.config.ca_key_location);
        let key = match runtime.block_on(manager.backup(&response)) {
            Err(SigningError::ConfirmationRequired) => anyhow::bail!("backup aborted"),
            other => other.context("failed to read the CA key")?,
        };

        match cli.format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "path": manager.path(),
                    "private_key": key,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Text => print!("{}", key),
        }
        Ok(())
    }
}

/// Prompt on a terminal; otherwise take the first line of piped stdin
fn read_confirmation() -> anyhow::Result<String> {
    let prompt = format!("Type '{}' to continue", BACKUP_CONFIRMATION);
    if std::io::stdin().is_terminal() {
        let response: String = Input::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()?;
        return Ok(response);
    }

    eprintln!("{}:", prompt);
    Ok(first_line(std::io::stdin().lock())?)
}

/// First line without its line ending; other whitespace is kept so the
/// exact-match check still applies
fn first_line(mut input: impl BufRead) -> std::io::Result<String> {
    let mut line = String::new();
    input.read_line(&mut line)?;
    let trimmed = line.trim_end_matches(['\n', '\r']).len();
    line.truncate(trimmed);
    Ok(line)
}
