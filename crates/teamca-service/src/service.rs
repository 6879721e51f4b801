//! Service lifecycle
//!
//! Sequencing for the long-running paths: publish client configs, serve
//! until the bot returns or a signal arrives, then retract.

use std::future::Future;
use std::sync::Arc;

use teamca_core::CaConfig;
use teamca_directory::ClientConfigDistributor;
use tracing::{error, info, warn};

use crate::bot::ChatBot;
use crate::error::{Result, ServiceError};
use crate::shutdown::{run_cleanup, ShutdownCoordinator, ShutdownOutcome, ShutdownState};

/// Drives guarded operations and their client config cleanup
pub struct ServiceRunner {
    config: Arc<CaConfig>,
    distributor: Arc<ClientConfigDistributor>,
    shutdown: ShutdownCoordinator,
}

impl ServiceRunner {
    pub fn new(
        config: Arc<CaConfig>,
        distributor: Arc<ClientConfigDistributor>,
        shutdown: ShutdownCoordinator,
    ) -> Self {
        Self {
            config,
            distributor,
            shutdown,
        }
    }

    pub fn shutdown(&self) -> &ShutdownCoordinator {
        &self.shutdown
    }

    /// Retract every client config, bounded by the configured timeout
    pub async fn cleanup(&self) -> Result<()> {
        let retract = async {
            self.distributor.retract(&self.config).await?;
            Ok::<(), ServiceError>(())
        };
        run_cleanup(retract, self.config.cleanup_timeout()).await
    }

    async fn interrupted(&self) -> ShutdownOutcome {
        let cleanup = self.cleanup().await;
        match &cleanup {
            Ok(()) => info!("cleanup after signal finished"),
            Err(e) => error!(error = %e, "cleanup after signal failed"),
        }
        ShutdownOutcome::Interrupted { cleanup }
    }

    /// Run a one-shot operation with the coordinator armed.
    ///
    /// A signal abandons `operation` and retracts client configs instead.
    pub async fn guard<F>(&self, operation: F) -> Result<ShutdownOutcome>
    where
        F: Future<Output = Result<()>>,
    {
        let listener = self.shutdown.arm()?;

        let finished = tokio::select! {
            biased;
            _ = self.shutdown.triggered() => None,
            result = operation => Some(result),
        };

        let outcome = match finished {
            None => self.interrupted().await,
            Some(result) => {
                listener.abort();
                result?;
                ShutdownOutcome::Completed
            }
        };
        Ok(outcome)
    }

    /// Publish client configs, run `bot` until it returns or a signal
    /// arrives, then retract.
    ///
    /// A bot error is returned after retraction has been attempted.
    pub async fn serve(&self, bot: &dyn ChatBot) -> Result<ShutdownOutcome> {
        if let Err(e) = self.distributor.publish(&self.config).await {
            if let Err(cleanup) = self.cleanup().await {
                warn!(error = %cleanup, "failed to retract partially published client configs");
            }
            return Err(e.into());
        }

        let listener = self.shutdown.arm()?;
        info!(teams = ?self.config.teams(), "CA service running");

        let finished = tokio::select! {
            biased;
            _ = self.shutdown.triggered() => None,
            result = bot.run(&self.config, self.shutdown.token()) => Some(result),
        };

        let Some(bot_result) = finished else {
            return Ok(self.interrupted().await);
        };
        // A signal that lands while the bot is returning is handled here
        if self.shutdown.state() == ShutdownState::Triggered {
            return Ok(self.interrupted().await);
        }
        listener.abort();

        let cleanup = self.cleanup().await;
        if let Err(e) = bot_result {
            if let Err(cleanup) = cleanup {
                warn!(error = %cleanup, "failed to retract client configs");
            }
            return Err(e);
        }
        cleanup?;
        Ok(ShutdownOutcome::Completed)
    }
}
