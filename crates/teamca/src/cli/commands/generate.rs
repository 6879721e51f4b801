//! Generate command

use anyhow::Context as _;
use clap::Args;
use teamca_core::config::env::{flag_enabled, FORCE_WRITE};
use teamca_service::{ServiceError, ShutdownOutcome};
use teamca_signing::CaKeyManager;
use tracing::info;

use crate::cli::context::{finish, Context};
use crate::cli::{output, Cli};

/// Generate a new CA key (set FORCE_WRITE=true to replace an existing one)
#[derive(Debug, Args)]
pub struct GenerateCommand {}

impl GenerateCommand {
    /// Execute the generate command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!("executing generate command");
        let runtime = tokio::runtime::Runtime::new()?;
        runtime.block_on(self.execute_async(cli))
    }

    async fn execute_async(&self, cli: &Cli) -> anyhow::Result<()> {
        let ctx = Context::online(cli).await?;
        let force = flag_enabled(FORCE_WRITE);
        let manager = CaKeyManager::new(&ctx.config.ca_key_location);

        let outcome = ctx
            .runner()
            .guard(async {
                manager.generate(force).await?;
                Ok::<(), ServiceError>(())
            })
            .await
            .context("failed to generate CA key")?;

        if matches!(outcome, ShutdownOutcome::Completed) {
            output::success(&format!(
                "Generated new CA key at {}",
                output::path_style().apply_to(manager.path().display())
            ));
        }
        finish(outcome)
    }
}
