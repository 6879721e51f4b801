//! Store accessed through the keybase CLI (`keybase fs ...`)

use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, instrument};

use super::TeamStore;
use crate::error::{DirectoryError, Result};
use crate::identity::AccountIdentity;

/// Team directory store driven by `keybase fs`
pub struct KeybaseCliStore {
    binary: String,
}

#[derive(Deserialize)]
struct Status {
    #[serde(rename = "Username")]
    username: String,
}

impl KeybaseCliStore {
    /// Drive the given keybase binary
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Run keybase, optionally feeding `input` on stdin
    async fn run(&self, args: &[&str], input: Option<&[u8]>) -> Result<Vec<u8>> {
        debug!("Running {} with args: {:?}", self.binary, args);

        let mut child = Command::new(&self.binary)
            .args(args)
            .stdin(if input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    DirectoryError::ToolNotFound {
                        tool: self.binary.clone(),
                        hint: "Install keybase or set KBFS_MOUNT to use a mounted store".to_string(),
                    }
                } else {
                    DirectoryError::Io(e)
                }
            })?;

        if let (Some(data), Some(mut stdin)) = (input, child.stdin.take()) {
            stdin.write_all(data).await?;
            stdin.shutdown().await?;
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            return Err(DirectoryError::Command {
                command: format!("{} {}", self.binary, args.join(" ")),
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output.stdout)
    }
}

/// keybase reports missing files as a failed command
fn is_missing(err: &DirectoryError) -> bool {
    match err {
        DirectoryError::Command { stderr, .. } => {
            let stderr = stderr.to_lowercase();
            stderr.contains("does not exist") || stderr.contains("not found")
        }
        _ => false,
    }
}

fn missing_to_not_found(path: &str, err: DirectoryError) -> DirectoryError {
    if is_missing(&err) {
        DirectoryError::NotFound(path.to_string())
    } else {
        err
    }
}

#[async_trait]
impl TeamStore for KeybaseCliStore {
    fn name(&self) -> &str {
        "keybase-cli"
    }

    #[instrument(skip(self))]
    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let output = self
            .run(&["fs", "ls", "-1", "--nocolor", prefix], None)
            .await
            .map_err(|e| missing_to_not_found(prefix, e))?;

        Ok(String::from_utf8_lossy(&output)
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        match self.run(&["fs", "stat", path], None).await {
            Ok(_) => Ok(true),
            Err(e) if is_missing(&e) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        self.run(&["fs", "read", path], None)
            .await
            .map_err(|e| missing_to_not_found(path, e))
    }

    #[instrument(skip(self, data), fields(bytes = data.len()))]
    async fn write(&self, path: &str, data: &[u8]) -> Result<()> {
        self.run(&["fs", "write", path], Some(data)).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, path: &str) -> Result<()> {
        self.run(&["fs", "rm", path], None)
            .await
            .map_err(|e| missing_to_not_found(path, e))?;
        Ok(())
    }
}

#[async_trait]
impl AccountIdentity for KeybaseCliStore {
    async fn username(&self) -> Result<String> {
        let output = self.run(&["status", "--json"], None).await?;
        let status: Status = serde_json::from_slice(&output)?;
        if status.username.is_empty() {
            return Err(DirectoryError::Identity(
                "keybase is not logged in".to_string(),
            ));
        }
        Ok(status.username)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_missing() {
        let missing = DirectoryError::Command {
            command: "keybase fs stat /keybase/team/a/x".to_string(),
            status: 1,
            stderr: "ERROR file does not exist".to_string(),
        };
        assert!(is_missing(&missing));

        let denied = DirectoryError::Command {
            command: "keybase fs stat /keybase/team/a/x".to_string(),
            status: 1,
            stderr: "ERROR permission denied".to_string(),
        };
        assert!(!is_missing(&denied));
        assert!(missing_to_not_found("/x", missing).is_not_found());
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let store = KeybaseCliStore::with_binary("teamca-test-no-such-binary");
        let err = store.exists("/keybase/team/a").await.unwrap_err();
        assert!(matches!(err, DirectoryError::ToolNotFound { .. }));
    }

    #[test]
    fn test_parse_status() {
        let status: Status =
            serde_json::from_str(r#"{"Username":"ca_bot","LoggedIn":true}"#).unwrap();
        assert_eq!(status.username, "ca_bot");
    }
}
