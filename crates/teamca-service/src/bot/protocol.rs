//! Chat message protocol spoken between clients and the signing bot
//!
//! - `AckRequest--<token>` is answered with `Ack--<token>`
//! - `Signature_Request:<json>` is answered with `Signature_Response:<json>`

use serde::{Deserialize, Serialize};

use crate::error::{Result, ServiceError};

pub const ACK_REQUEST_PREFIX: &str = "AckRequest--";
pub const ACK_RESPONSE_PREFIX: &str = "Ack--";
pub const SIGNATURE_REQUEST_PREFIX: &str = "Signature_Request:";
pub const SIGNATURE_RESPONSE_PREFIX: &str = "Signature_Response:";

/// Body of a signature request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureRequest {
    #[serde(rename = "SSHPublicKey")]
    pub ssh_public_key: String,
    /// Client-chosen correlation ID echoed in the response
    #[serde(rename = "UUID")]
    pub uuid: String,
}

/// Body of a signature response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureResponse {
    #[serde(rename = "SignedKey")]
    pub signed_key: String,
    #[serde(rename = "UUID")]
    pub uuid: String,
}

/// A message addressed to the bot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotRequest {
    Ack(String),
    Sign(SignatureRequest),
}

/// A reply from the bot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotResponse {
    Ack(String),
    Signature(SignatureResponse),
}

impl BotRequest {
    /// `Ok(None)` for ordinary chatter the bot should ignore
    pub fn parse(body: &str) -> Result<Option<Self>> {
        let body = body.trim();
        if let Some(token) = body.strip_prefix(ACK_REQUEST_PREFIX) {
            return Ok(Some(Self::Ack(token.to_string())));
        }
        if let Some(json) = body.strip_prefix(SIGNATURE_REQUEST_PREFIX) {
            let request: SignatureRequest = serde_json::from_str(json)
                .map_err(|e| ServiceError::Protocol(format!("signature request: {}", e)))?;
            return Ok(Some(Self::Sign(request)));
        }
        Ok(None)
    }
}

impl BotResponse {
    pub fn encode(&self) -> Result<String> {
        Ok(match self {
            Self::Ack(token) => format!("{}{}", ACK_RESPONSE_PREFIX, token),
            Self::Signature(response) => format!(
                "{}{}",
                SIGNATURE_RESPONSE_PREFIX,
                serde_json::to_string(response)?
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_requests() {
        assert_eq!(
            BotRequest::parse("AckRequest--abc123").unwrap(),
            Some(BotRequest::Ack("abc123".to_string()))
        );

        let sign = BotRequest::parse(
            r#"Signature_Request:{"SSHPublicKey":"ssh-ed25519 AAAA me","UUID":"42"}"#,
        )
        .unwrap();
        assert_eq!(
            sign,
            Some(BotRequest::Sign(SignatureRequest {
                ssh_public_key: "ssh-ed25519 AAAA me".to_string(),
                uuid: "42".to_string(),
            }))
        );

        assert_eq!(BotRequest::parse("hello team").unwrap(), None);
        assert!(matches!(
            BotRequest::parse("Signature_Request:{not json"),
            Err(ServiceError::Protocol(_))
        ));
    }

    #[test]
    fn test_encode_responses() {
        assert_eq!(
            BotResponse::Ack("abc123".to_string()).encode().unwrap(),
            "Ack--abc123"
        );

        let encoded = BotResponse::Signature(SignatureResponse {
            signed_key: "ssh-ed25519-cert-v01@openssh.com AAAA".to_string(),
            uuid: "42".to_string(),
        })
        .encode()
        .unwrap();
        assert_eq!(
            encoded,
            r#"Signature_Response:{"SignedKey":"ssh-ed25519-cert-v01@openssh.com AAAA","UUID":"42"}"#
        );
    }
}
