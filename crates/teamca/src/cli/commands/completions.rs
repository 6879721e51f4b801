//! Shell completions

use std::io::Write;
use std::path::PathBuf;

use clap::{Args, CommandFactory};
use clap_complete::{generate, Shell};
use tracing::info;

use crate::cli::{output, Cli};

const BIN_NAME: &str = "teamca";

/// Generate shell completions for teamca
#[derive(Debug, Args)]
pub struct CompletionsCommand {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,

    /// Write to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl CompletionsCommand {
    /// Execute the completions command
    pub fn execute(&self, _cli: &Cli) -> anyhow::Result<()> {
        info!(shell = %self.shell, "executing completions command");

        match &self.output {
            Some(path) => {
                let mut file = std::fs::File::create(path)?;
                write_completions(self.shell, &mut file);
                file.flush()?;
                output::success(&format!(
                    "Completions written to {}",
                    output::path_style().apply_to(path.display())
                ));
            }
            None => write_completions(self.shell, &mut std::io::stdout()),
        }
        Ok(())
    }
}

fn write_completions(shell: Shell, out: &mut dyn Write) {
    generate(shell, &mut Cli::command(), BIN_NAME, out);
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_completions_cover_commands() {
        let mut buf = Vec::new();
        write_completions(Shell::Bash, &mut buf);
        let script = String::from_utf8(buf).unwrap();
        for name in ["backup", "generate", "service", "sign", "--public-key"] {
            assert!(script.contains(name), "missing {}", name);
        }
    }

    #[test]
    fn test_completions_to_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("teamca.zsh");
        let cmd = CompletionsCommand {
            shell: Shell::Zsh,
            output: Some(path.clone()),
        };
        let cli = Cli::parse_from(["teamca", "completions", "zsh"]);

        cmd.execute(&cli).unwrap();
        let script = std::fs::read_to_string(&path).unwrap();
        assert!(script.contains("#compdef teamca"));
    }
}
