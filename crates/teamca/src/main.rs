//! teamca - SSH certificate authority for team-scoped, short-lived credentials

mod cli;
mod exit_codes;

use std::path::{Path, PathBuf};

use clap::Parser;
use teamca_core::config::load_config_from_env;
use teamca_core::CaConfig;
use teamca_directory::{is_store_path, MountedStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use cli::{output, Cli};

fn main() {
    let cli = Cli::parse();
    let config = load_config_from_env(cli.config.as_deref()).ok();
    let log = resolve_log_file(config.as_ref());
    let guard = init_tracing(cli.debug, log.path().map(Path::to_path_buf));

    if let LogFile::Unmounted(location) = &log {
        tracing::warn!(
            location = %location.display(),
            "log location is a store path but no store mount is configured; logs and audit events are not persisted"
        );
        output::warning(&format!(
            "Not writing logs to {}: set KBFS_MOUNT to persist logs and audit events",
            location.display()
        ));
    }

    let code = match cli.execute() {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            tracing::error!(error = %format!("{:#}", e), "command failed");
            output::error(&format!("{:#}", e));
            exit_codes::ERROR
        }
    };

    // Flush the file layer before exiting
    drop(guard);
    std::process::exit(code);
}

/// Set up tracing with two layers:
/// - Console: controlled by RUST_LOG (default: warn, debug with --debug)
/// - File: debug-level JSON to the configured log location
fn init_tracing(
    debug: bool,
    log_file: Option<PathBuf>,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if debug { "debug" } else { "warn" }));

    if let Some((dir, name)) = log_file.as_deref().and_then(split_log_path) {
        if std::fs::create_dir_all(&dir).is_ok() {
            let file_appender = tracing_appender::rolling::never(&dir, name);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_target(false)
                        .with_writer(std::io::stderr)
                        .with_filter(console_filter),
                )
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking)
                        .with_target(true)
                        .with_filter(EnvFilter::new("debug")),
                )
                .init();

            return Some(guard);
        }
    }

    // Fallback: console only
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .with_filter(console_filter),
        )
        .init();

    None
}

/// Where the JSON log layer writes
#[derive(Debug, PartialEq, Eq)]
enum LogFile {
    Local(PathBuf),
    /// A store location with no mount to write it through
    Unmounted(PathBuf),
    Disabled,
}

impl LogFile {
    fn path(&self) -> Option<&Path> {
        match self {
            Self::Local(path) => Some(path),
            Self::Unmounted(_) | Self::Disabled => None,
        }
    }
}

/// The configured log location wins; store paths are only writable through
/// a mount. Without a configured location logs go under `~/.teamca/logs`.
fn resolve_log_file(config: Option<&CaConfig>) -> LogFile {
    match config.and_then(|c| c.log_location.as_ref()) {
        Some(location) if is_store_path(location) => {
            match config.and_then(|c| c.store.mount.as_ref()) {
                Some(mount) => MountedStore::new(mount)
                    .local_path(&location.to_string_lossy())
                    .map_or(LogFile::Disabled, LogFile::Local),
                None => LogFile::Unmounted(location.clone()),
            }
        }
        Some(location) => LogFile::Local(location.clone()),
        None => dirs::home_dir().map_or(LogFile::Disabled, |home| {
            LogFile::Local(home.join(".teamca").join("logs").join("teamca.log"))
        }),
    }
}

fn split_log_path(path: &Path) -> Option<(PathBuf, String)> {
    let name = path.file_name()?.to_string_lossy().into_owned();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Some((dir, name))
}
