//! Certificate signing contract and the ssh-keygen implementation

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::process::Command;
use tracing::{debug, info, instrument};

use crate::error::{Result, SigningError};
use crate::request::{Certificate, SigningRequest};

pub(crate) const SSH_KEYGEN: &str = "ssh-keygen";

/// Turns a CA key and a [`SigningRequest`] into a certificate.
///
/// Implementations must either return a complete certificate or an error;
/// partial output is never observable.
#[async_trait]
pub trait CertificateSigner: Send + Sync {
    /// Get the name of this signer
    fn name(&self) -> &str;

    /// Sign `request` with the CA key stored at `ca_key`
    async fn sign(&self, ca_key: &Path, request: &SigningRequest) -> Result<Certificate>;
}

/// Signs with OpenSSH's `ssh-keygen -s`
pub struct SshKeygenSigner {
    ssh_keygen: String,
}

impl SshKeygenSigner {
    pub fn new() -> Self {
        Self {
            ssh_keygen: SSH_KEYGEN.to_string(),
        }
    }

    /// Check if ssh-keygen can be found
    pub fn is_available(&self) -> bool {
        which::which(&self.ssh_keygen).is_ok()
    }
}

impl Default for SshKeygenSigner {
    fn default() -> Self {
        Self::new()
    }
}

/// Reject anything that is not a single `<type> <base64> [comment]` line
pub(crate) fn check_public_key(public_key: &str) -> Result<&str> {
    let line = public_key.trim();
    let mut fields = line.split_whitespace();
    let key_type = fields.next().unwrap_or_default();
    let body = fields.next().unwrap_or_default();

    let known_type = key_type.starts_with("ssh-")
        || key_type.starts_with("ecdsa-")
        || key_type.starts_with("sk-");
    if !known_type || body.is_empty() || line.lines().count() != 1 {
        return Err(SigningError::InvalidPublicKey(
            "expected a single OpenSSH public key line".to_string(),
        ));
    }
    if key_type.contains("-cert-") {
        return Err(SigningError::InvalidPublicKey(
            "cannot sign a certificate, supply the public key".to_string(),
        ));
    }
    Ok(line)
}

#[async_trait]
impl CertificateSigner for SshKeygenSigner {
    fn name(&self) -> &str {
        "ssh-keygen"
    }

    #[instrument(skip(self, request), fields(key_id = %request.key_id))]
    async fn sign(&self, ca_key: &Path, request: &SigningRequest) -> Result<Certificate> {
        if request.principals.is_empty() {
            return Err(SigningError::NoPrincipals);
        }
        let public_key = check_public_key(&request.public_key)?;
        if !ca_key.exists() {
            return Err(SigningError::KeyNotFound(ca_key.to_path_buf()));
        }

        // ssh-keygen signs files in place, so work on a private copy
        let workdir = tempfile::tempdir()?;
        let key_file = workdir.path().join("request.pub");
        tokio::fs::write(&key_file, format!("{}\n", public_key)).await?;

        let ca = ca_key.to_string_lossy();
        let principals = request.principals.join(",");
        let validity = format!("+{}s", request.expiration.as_secs());
        let target = key_file.to_string_lossy();

        let valid_after = Utc::now();
        run_ssh_keygen(
            &self.ssh_keygen,
            &[
                "-s",
                &ca,
                "-I",
                request.key_id.as_str(),
                "-n",
                &principals,
                "-V",
                &validity,
                "-q",
                &target,
            ],
        )
        .await?;

        let contents = tokio::fs::read_to_string(workdir.path().join("request-cert.pub")).await?;
        let valid_before = chrono::Duration::from_std(request.expiration)
            .ok()
            .and_then(|d| valid_after.checked_add_signed(d))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        info!(
            target: "teamca::audit",
            key_id = %request.key_id,
            principals = %principals,
            valid_before = %valid_before.to_rfc3339(),
            "issued certificate"
        );

        Ok(Certificate {
            contents,
            key_id: request.key_id.clone(),
            principals: request.principals.clone(),
            valid_after,
            valid_before,
        })
    }
}

/// Run ssh-keygen and return stdout
pub(crate) async fn run_ssh_keygen(ssh_keygen: &str, args: &[&str]) -> Result<String> {
    debug!("Running {} with args: {:?}", ssh_keygen, args);

    let output = Command::new(ssh_keygen)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SigningError::ToolNotFound {
                    tool: ssh_keygen.to_string(),
                    hint: "Install OpenSSH to generate keys and sign certificates".to_string(),
                }
            } else {
                SigningError::Io(e)
            }
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    if !output.status.success() {
        return Err(SigningError::ToolFailed {
            tool: ssh_keygen.to_string(),
            reason: if stderr.is_empty() { stdout } else { stderr },
        });
    }

    Ok(stdout)
}
