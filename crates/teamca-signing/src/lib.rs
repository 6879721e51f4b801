//! teamca signing - CA key lifecycle and SSH certificate issuance
//!
//! - [`CaKeyManager`] owns the CA private key file: one-time creation,
//!   confirmed export, read access for signing
//! - [`CertificateSigner`] is the signing contract; [`SshKeygenSigner`]
//!   implements it with OpenSSH's `ssh-keygen`
//! - [`manual`] is the offline sign path that writes or prints a certificate
//!   next to a public key

pub mod error;
pub mod key;
pub mod manual;
pub mod request;
pub mod signer;

pub use error::{Result, SigningError};
pub use key::{CaKeyManager, BACKUP_CONFIRMATION};
pub use manual::{certificate_path, sign_public_key_file, SignOutcome, MANUAL_SIGN_TAG};
pub use request::{Certificate, KeyId, SigningRequest};
pub use signer::{CertificateSigner, SshKeygenSigner};
