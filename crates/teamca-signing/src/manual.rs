//! Offline signing of a public key file

use std::path::{Path, PathBuf};

use teamca_core::CaConfig;
use tracing::{debug, info};

use crate::error::Result;
use crate::key::restrict_permissions;
use crate::request::{Certificate, KeyId, SigningRequest};
use crate::signer::CertificateSigner;

/// Key ID context for certificates issued by the offline sign path
pub const MANUAL_SIGN_TAG: &str = "teamca-sign";

/// Where OpenSSH looks for the certificate of `public_key`:
/// `~/.ssh/id_ed25519.pub` becomes `~/.ssh/id_ed25519-cert.pub`.
pub fn certificate_path(public_key: &Path) -> PathBuf {
    let name = public_key.as_os_str().to_string_lossy();
    let stem = name.strip_suffix(".pub").unwrap_or(&name);
    PathBuf::from(format!("{}-cert.pub", stem))
}

/// What the sign path did with the certificate
#[derive(Debug, Clone)]
pub enum SignOutcome {
    /// Written to `path`
    Written { path: PathBuf, certificate: Certificate },
    /// A certificate already existed at `path`; the caller should print this one
    Printed { path: PathBuf, certificate: Certificate },
}

impl SignOutcome {
    pub fn certificate(&self) -> &Certificate {
        match self {
            Self::Written { certificate, .. } | Self::Printed { certificate, .. } => certificate,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::Written { path, .. } | Self::Printed { path, .. } => path,
        }
    }
}

/// Sign the public key at `public_key` for every configured team.
///
/// The certificate is written next to the key when no certificate exists
/// there yet, or when `overwrite` is set; otherwise it is handed back for
/// printing and the filesystem is left alone.
pub async fn sign_public_key_file(
    signer: &dyn CertificateSigner,
    config: &CaConfig,
    public_key: &Path,
    overwrite: bool,
) -> Result<SignOutcome> {
    let key = tokio::fs::read_to_string(public_key).await?;
    debug!(path = %public_key.display(), signer = signer.name(), "signing public key file");

    let request = SigningRequest::new(
        key,
        config.teams().to_vec(),
        KeyId::generate(Some(MANUAL_SIGN_TAG)),
        config.key_expiration(),
    );
    let certificate = signer.sign(&config.ca_key_location, &request).await?;

    let path = certificate_path(public_key);
    if path.exists() && !overwrite {
        info!(path = %path.display(), "certificate exists, not overwriting");
        return Ok(SignOutcome::Printed { path, certificate });
    }

    tokio::fs::write(&path, &certificate.contents).await?;
    restrict_permissions(&path).await?;
    info!(path = %path.display(), key_id = %certificate.key_id, "wrote certificate");
    Ok(SignOutcome::Written { path, certificate })
}
