//! Configuration and collaborators shared by the commands

use std::sync::Arc;

use anyhow::Context as _;
use teamca_core::config::load_config_from_env;
use teamca_core::CaConfig;
use teamca_directory::{
    store_from_config, verify_team_access, AccountIdentity, ClientConfigDistributor, TeamStore,
};
use teamca_service::{ServiceRunner, ShutdownCoordinator, ShutdownOutcome};
use tracing::debug;

use super::{output, Cli};

/// Load and validate configuration without touching the store
pub fn offline_config(cli: &Cli) -> anyhow::Result<CaConfig> {
    load_config_from_env(cli.config.as_deref()).context("invalid configuration")
}

/// Validated configuration plus the store it was checked against
pub struct Context {
    pub config: Arc<CaConfig>,
    pub store: Arc<dyn TeamStore>,
    pub identity: Arc<dyn AccountIdentity>,
}

impl Context {
    /// Load configuration and confirm the CA account can reach every team
    pub async fn online(cli: &Cli) -> anyhow::Result<Self> {
        let config = offline_config(cli)?;
        let (store, identity) = store_from_config(&config);
        debug!(store = store.name(), "verifying team access");

        verify_team_access(&*store, &config)
            .await
            .context("invalid configuration")?;

        Ok(Self {
            config: Arc::new(config),
            store,
            identity,
        })
    }

    pub fn distributor(&self) -> Arc<ClientConfigDistributor> {
        Arc::new(ClientConfigDistributor::new(
            self.store.clone(),
            self.identity.clone(),
            self.config.concurrency.distribution,
        ))
    }

    /// Runner whose signal cleanup retracts this context's client configs
    pub fn runner(&self) -> ServiceRunner {
        ServiceRunner::new(
            self.config.clone(),
            self.distributor(),
            ShutdownCoordinator::new(),
        )
    }
}

/// Map a guarded operation's outcome onto the command result
pub fn finish(outcome: ShutdownOutcome) -> anyhow::Result<()> {
    match outcome {
        ShutdownOutcome::Completed => Ok(()),
        ShutdownOutcome::Interrupted { cleanup: Ok(()) } => {
            output::info("Interrupted; client configs removed");
            Ok(())
        }
        ShutdownOutcome::Interrupted { cleanup: Err(e) } => Err(anyhow::Error::new(e)
            .context("failed to remove client configs after termination signal")),
    }
}
