//! Shutdown coordination
//!
//! A [`ShutdownCoordinator`] starts `Armed`. The first termination signal
//! (or an explicit [`ShutdownCoordinator::trigger`]) moves it to `Triggered`
//! and cancels its token; whoever owns the running operation observes the
//! token and runs cleanup.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::{Result, ServiceError};

/// Coordinator state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownState {
    /// Waiting for a termination signal
    Armed,
    /// A signal arrived; cleanup owns the process
    Triggered,
}

/// How a guarded operation ended
#[derive(Debug)]
pub enum ShutdownOutcome {
    /// The operation ran to completion
    Completed,
    /// A termination signal interrupted the operation and cleanup ran
    Interrupted { cleanup: Result<()> },
}

impl ShutdownOutcome {
    /// Whether the process should exit successfully
    pub fn is_success(&self) -> bool {
        match self {
            Self::Completed => true,
            Self::Interrupted { cleanup } => cleanup.is_ok(),
        }
    }
}

/// Converts termination signals into a cancellation token
#[derive(Debug, Clone, Default)]
pub struct ShutdownCoordinator {
    token: CancellationToken,
    triggered: Arc<AtomicBool>,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ShutdownState {
        if self.triggered.load(Ordering::SeqCst) {
            ShutdownState::Triggered
        } else {
            ShutdownState::Armed
        }
    }

    /// Token cancelled once the coordinator is triggered
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Move to `Triggered`. Returns false if already triggered.
    pub fn trigger(&self) -> bool {
        let first = !self.triggered.swap(true, Ordering::SeqCst);
        if first {
            info!("shutdown triggered");
            self.token.cancel();
        }
        first
    }

    /// Resolves once the coordinator is triggered
    pub async fn triggered(&self) {
        self.token.cancelled().await
    }

    /// Listen for SIGINT and SIGTERM in the background.
    ///
    /// Signal handlers are installed before this returns, so a signal
    /// delivered afterwards is never missed.
    pub fn arm(&self) -> Result<JoinHandle<()>> {
        let mut signals = SignalListener::install()?;

        let coordinator = self.clone();
        let token = self.token.clone();
        Ok(tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => return,
                received = signals.recv() => match received {
                    Ok(signal) => info!(signal, "received termination signal"),
                    Err(e) => {
                        warn!(error = %e, "failed to listen for termination signals");
                        return;
                    }
                },
            }
            coordinator.trigger();
        }))
    }
}

/// Termination signal streams, registered with the OS on construction
struct SignalListener {
    #[cfg(unix)]
    streams: [(tokio::signal::unix::Signal, &'static str); 2],
}

impl SignalListener {
    #[cfg(unix)]
    fn install() -> Result<Self> {
        use tokio::signal::unix::SignalKind;
        Self::for_kinds([
            (SignalKind::interrupt(), "SIGINT"),
            (SignalKind::terminate(), "SIGTERM"),
        ])
    }

    #[cfg(not(unix))]
    fn install() -> Result<Self> {
        Ok(Self {})
    }

    #[cfg(unix)]
    fn for_kinds(kinds: [(tokio::signal::unix::SignalKind, &'static str); 2]) -> Result<Self> {
        use tokio::signal::unix::signal;
        let [(first, first_name), (second, second_name)] = kinds;
        Ok(Self {
            streams: [(signal(first)?, first_name), (signal(second)?, second_name)],
        })
    }

    /// Wait for the next signal and return its name
    #[cfg(unix)]
    async fn recv(&mut self) -> Result<&'static str> {
        let [(first, first_name), (second, second_name)] = &mut self.streams;
        tokio::select! {
            _ = first.recv() => Ok(*first_name),
            _ = second.recv() => Ok(*second_name),
        }
    }

    #[cfg(not(unix))]
    async fn recv(&mut self) -> Result<&'static str> {
        tokio::signal::ctrl_c().await?;
        Ok("SIGINT")
    }
}

/// Run `cleanup`, giving up after `timeout` when one is set
pub async fn run_cleanup<F>(cleanup: F, timeout: Option<Duration>) -> Result<()>
where
    F: Future<Output = Result<()>>,
{
    match timeout {
        Some(limit) => tokio::time::timeout(limit, cleanup)
            .await
            .unwrap_or(Err(ServiceError::CleanupTimedOut(limit))),
        None => cleanup.await,
    }
}
