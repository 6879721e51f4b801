//! Signing requests and issued certificates

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Unique certificate identifier, `<uuid>` or `<uuid>:<context>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyId(String);

impl KeyId {
    /// Fresh random identifier tagged with where the request came from
    pub fn generate(context: Option<&str>) -> Self {
        let uuid = Uuid::new_v4();
        match context {
            Some(tag) if !tag.is_empty() => Self(format!("{}:{}", uuid, tag)),
            _ => Self(uuid.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything the signer needs for one certificate
#[derive(Debug, Clone)]
pub struct SigningRequest {
    /// OpenSSH public key line
    pub public_key: String,
    /// Identities the certificate is valid for
    pub principals: Vec<String>,
    pub key_id: KeyId,
    /// Validity measured from the signing call
    pub expiration: Duration,
}

impl SigningRequest {
    pub fn new(
        public_key: impl Into<String>,
        principals: Vec<String>,
        key_id: KeyId,
        expiration: Duration,
    ) -> Self {
        Self {
            public_key: public_key.into(),
            principals,
            key_id,
            expiration,
        }
    }
}

/// A signed certificate as produced by the signer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    /// Certificate in OpenSSH text form (`<type>-cert-v01@openssh.com ...`)
    pub contents: String,
    pub key_id: KeyId,
    pub principals: Vec<String>,
    pub valid_after: DateTime<Utc>,
    pub valid_before: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_ids_are_unique() {
        let a = KeyId::generate(Some("manual"));
        let b = KeyId::generate(Some("manual"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_key_id_context_suffix() {
        let id = KeyId::generate(Some("alice"));
        let (uuid, tag) = id.as_str().split_once(':').unwrap();
        assert!(Uuid::parse_str(uuid).is_ok());
        assert_eq!(tag, "alice");

        let bare = KeyId::generate(None);
        assert!(Uuid::parse_str(bare.as_str()).is_ok());
    }
}
