//! CLI commands

mod backup;
mod completions;
mod generate;
mod maintenance;
mod service;
mod sign;

pub use backup::BackupCommand;
pub use completions::CompletionsCommand;
pub use generate::GenerateCommand;
pub use maintenance::{WipeAllConfigsCommand, WipeLogsCommand};
pub use service::ServiceCommand;
pub use sign::SignCommand;
