//! Sign command

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Args;
use teamca_signing::{sign_public_key_file, SignOutcome, SshKeygenSigner};
use tracing::info;

use crate::cli::context::offline_config;
use crate::cli::{output, Cli, OutputFormat};

/// Sign a public key without the chat service
#[derive(Debug, Args)]
pub struct SignCommand {
    /// Public key to sign
    #[arg(long, required = true)]
    pub public_key: PathBuf,

    /// Replace an existing certificate next to the key
    #[arg(long)]
    pub overwrite: bool,
}

impl SignCommand {
    /// Execute the sign command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(public_key = %self.public_key.display(), "executing sign command");
        let runtime = tokio::runtime::Runtime::new()?;
        runtime.block_on(self.execute_async(cli))
    }

    async fn execute_async(&self, cli: &Cli) -> anyhow::Result<()> {
        // Offline on purpose: this path must work while chat is unavailable
        let config = offline_config(cli)?;

        let outcome = sign_public_key_file(
            &SshKeygenSigner::new(),
            &config,
            &self.public_key,
            self.overwrite,
        )
        .await
        .with_context(|| format!("failed to sign {}", self.public_key.display()))?;

        if cli.format == OutputFormat::Json {
            let output = serde_json::json!({
                "path": outcome.path(),
                "written": matches!(outcome, SignOutcome::Written { .. }),
                "key_id": outcome.certificate().key_id.as_str(),
                "principals": outcome.certificate().principals,
                "certificate": outcome.certificate().contents,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        match &outcome {
            SignOutcome::Written { path, .. } => output::success(&format!(
                "Wrote certificate to {}",
                output::path_style().apply_to(path.display())
            )),
            SignOutcome::Printed { path, certificate } => {
                output::info(&format!(
                    "{} already exists; pass --overwrite to replace it. New certificate:",
                    output::path_style().apply_to(path.display())
                ));
                print!("{}", certificate.contents);
            }
        }
        Ok(())
    }
}
