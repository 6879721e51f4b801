//! Service command

use std::sync::Arc;

use anyhow::Context as _;
use clap::Args;
use teamca_service::{KeybaseChatTransport, SigningBot};
use teamca_signing::{CaKeyManager, SshKeygenSigner};
use tracing::info;

use crate::cli::context::{finish, Context};
use crate::cli::{output, Cli};

/// Publish client configs and serve signing requests until stopped
#[derive(Debug, Args)]
pub struct ServiceCommand {}

impl ServiceCommand {
    /// Execute the service command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!("executing service command");
        let runtime = tokio::runtime::Runtime::new()?;
        runtime.block_on(self.execute_async(cli))
    }

    async fn execute_async(&self, cli: &Cli) -> anyhow::Result<()> {
        let ctx = Context::online(cli).await?;

        let key = CaKeyManager::new(&ctx.config.ca_key_location);
        if !key.exists() {
            anyhow::bail!(
                "no CA key at {}; run `teamca generate` first",
                key.path().display()
            );
        }

        let bot = SigningBot::new(
            Arc::new(KeybaseChatTransport::with_binary(
                &ctx.config.store.keybase_binary,
            )),
            Arc::new(SshKeygenSigner::new()),
            ctx.identity.clone(),
        );

        output::info(&format!(
            "Serving {} team(s); press Ctrl-C to stop",
            ctx.config.teams().len()
        ));
        let outcome = ctx
            .runner()
            .serve(&bot)
            .await
            .context("CA service failed")?;
        finish(outcome)
    }
}
