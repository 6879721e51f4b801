//! Hidden maintenance commands

use anyhow::Context as _;
use clap::Args;
use teamca_directory::{remove_log_artifact, BoundedScanner, LogLocation};
use tracing::info;

use crate::cli::context::Context;
use crate::cli::{output, Cli, OutputFormat};

/// Delete the client config of every team the CA account belongs to
#[derive(Debug, Args)]
pub struct WipeAllConfigsCommand {}

/// Delete the CA log file
#[derive(Debug, Args)]
pub struct WipeLogsCommand {}

impl WipeAllConfigsCommand {
    /// Execute the wipe-all-configs command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!("executing wipe-all-configs command");
        let runtime = tokio::runtime::Runtime::new()?;
        runtime.block_on(self.execute_async(cli))
    }

    async fn execute_async(&self, cli: &Cli) -> anyhow::Result<()> {
        let ctx = Context::online(cli).await?;
        let scanner = BoundedScanner::new(ctx.store.clone(), ctx.config.concurrency.maintenance);

        let deleted = scanner
            .wipe_client_configs()
            .await
            .context("failed to list teams")?;

        match cli.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&deleted)?),
            OutputFormat::Text if deleted.is_empty() => {
                output::info("No client configs found");
            }
            OutputFormat::Text => {
                for team in &deleted {
                    output::success(&format!(
                        "Deleted client config for {}",
                        output::team_style().apply_to(team)
                    ));
                }
            }
        }
        Ok(())
    }
}

impl WipeLogsCommand {
    /// Execute the wipe-logs command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!("executing wipe-logs command");
        let runtime = tokio::runtime::Runtime::new()?;
        runtime.block_on(self.execute_async(cli))
    }

    async fn execute_async(&self, cli: &Cli) -> anyhow::Result<()> {
        let ctx = Context::online(cli).await?;
        let Some(path) = ctx.config.log_location.as_deref() else {
            anyhow::bail!("no log location configured (set LOG_LOCATION)");
        };

        let location = remove_log_artifact(&*ctx.store, path)
            .await
            .with_context(|| format!("failed to delete {}", path.display()))?;

        let place = match location {
            LogLocation::Store => "team directory",
            LogLocation::Local => "local filesystem",
        };
        output::success(&format!(
            "Deleted {} from the {}",
            output::path_style().apply_to(path.display()),
            place
        ));
        println!("{}", output::key_value("store", ctx.store.name()));
        Ok(())
    }
}
