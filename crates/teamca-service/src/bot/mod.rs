//! Chat signing bot
//!
//! The bot listens on a [`ChatTransport`], answers acknowledgement pings and
//! turns signature requests into certificates through the same
//! [`CertificateSigner`] the offline sign path uses.

mod keybase;
pub mod protocol;

use std::sync::Arc;

use async_trait::async_trait;
use teamca_core::CaConfig;
use teamca_directory::AccountIdentity;
use teamca_signing::{CertificateSigner, KeyId, SigningRequest};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::error::{Result, ServiceError};
use protocol::{BotRequest, BotResponse, SignatureRequest, SignatureResponse};

pub use keybase::KeybaseChatTransport;

/// One incoming chat message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Opaque conversation handle used to reply
    pub conversation_id: String,
    /// Team the conversation belongs to, `None` for direct messages
    pub team: Option<String>,
    /// Channel within the team
    pub channel: Option<String>,
    pub sender: String,
    pub body: String,
}

/// Chat collaborator the bot reads requests from and replies through
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Next incoming message; `None` once the stream has ended
    async fn next_message(&self) -> Result<Option<ChatMessage>>;

    /// Post `body` into a conversation
    async fn send(&self, conversation_id: &str, body: &str) -> Result<()>;

    /// Whether `user` belongs to `team`
    async fn is_member(&self, team: &str, user: &str) -> Result<bool>;
}

/// Long-running request handler started by the service command
#[async_trait]
pub trait ChatBot: Send + Sync {
    /// Serve until `shutdown` is cancelled or the bot fails
    async fn run(&self, config: &CaConfig, shutdown: CancellationToken) -> Result<()>;
}

/// Bot that signs public keys for members of the configured teams
pub struct SigningBot {
    transport: Arc<dyn ChatTransport>,
    signer: Arc<dyn CertificateSigner>,
    identity: Arc<dyn AccountIdentity>,
}

impl SigningBot {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        signer: Arc<dyn CertificateSigner>,
        identity: Arc<dyn AccountIdentity>,
    ) -> Self {
        Self {
            transport,
            signer,
            identity,
        }
    }

    /// Whether the bot should answer in the message's conversation
    fn accepts(config: &CaConfig, message: &ChatMessage) -> bool {
        let Some(team) = message.team.as_deref() else {
            return false;
        };
        match &config.chat_channel {
            Some(chat) => {
                chat.team == team
                    && chat
                        .channel
                        .as_deref()
                        .map_or(true, |c| message.channel.as_deref() == Some(c))
            }
            None => config.teams().iter().any(|t| t == team),
        }
    }

    /// Configured teams `user` is a member of
    async fn principals_for(&self, config: &CaConfig, user: &str) -> Result<Vec<String>> {
        let mut principals = Vec::new();
        for team in config.teams() {
            if self.transport.is_member(team, user).await? {
                principals.push(team.clone());
            }
        }
        Ok(principals)
    }

    #[instrument(skip(self, config, request), fields(uuid = %request.uuid))]
    async fn sign(
        &self,
        config: &CaConfig,
        sender: &str,
        request: SignatureRequest,
    ) -> Result<BotResponse> {
        let principals = self.principals_for(config, sender).await?;
        if principals.is_empty() {
            return Err(ServiceError::Unauthorized(sender.to_string()));
        }

        let signing = SigningRequest::new(
            request.ssh_public_key,
            principals,
            KeyId::generate(Some(sender)),
            config.key_expiration(),
        );
        let certificate = self.signer.sign(&config.ca_key_location, &signing).await?;
        info!(
            target: "teamca::audit",
            user = %sender,
            key_id = %certificate.key_id,
            "signed key for chat request"
        );

        Ok(BotResponse::Signature(SignatureResponse {
            signed_key: certificate.contents,
            uuid: request.uuid,
        }))
    }

    /// Reply for one message, `None` when it needs no answer
    pub async fn handle(&self, config: &CaConfig, message: &ChatMessage) -> Result<Option<String>> {
        let response = match BotRequest::parse(&message.body)? {
            None => return Ok(None),
            Some(BotRequest::Ack(token)) => BotResponse::Ack(token),
            Some(BotRequest::Sign(request)) => self.sign(config, &message.sender, request).await?,
        };
        response.encode().map(Some)
    }
}

#[async_trait]
impl ChatBot for SigningBot {
    async fn run(&self, config: &CaConfig, shutdown: CancellationToken) -> Result<()> {
        let me = self.identity.username().await?;
        info!(bot = %me, "signing bot listening");

        loop {
            let next = tokio::select! {
                biased;
                _ = shutdown.cancelled() => return Ok(()),
                next = self.transport.next_message() => next?,
            };
            let Some(message) = next else {
                return Err(ServiceError::Transport("chat listener exited".to_string()));
            };

            if message.sender == me || !Self::accepts(config, &message) {
                debug!(sender = %message.sender, "ignoring message");
                continue;
            }

            match self.handle(config, &message).await {
                Ok(Some(reply)) => {
                    if let Err(e) = self.transport.send(&message.conversation_id, &reply).await {
                        warn!(error = %e, sender = %message.sender, "failed to send reply");
                    }
                }
                Ok(None) => {}
                Err(e) => warn!(error = %e, sender = %message.sender, "request failed"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::{HashMap, VecDeque};
    use std::path::Path;
    use std::sync::Mutex;
    use teamca_directory::StaticIdentity;
    use teamca_signing::{Certificate, SigningError};

    /// Scripted transport: replays queued messages, records replies
    #[derive(Default)]
    struct FakeTransport {
        incoming: Mutex<VecDeque<ChatMessage>>,
        sent: Mutex<Vec<(String, String)>>,
        members: HashMap<String, Vec<String>>,
    }

    #[async_trait]
    impl ChatTransport for FakeTransport {
        async fn next_message(&self) -> Result<Option<ChatMessage>> {
            Ok(self.incoming.lock().unwrap().pop_front())
        }

        async fn send(&self, conversation_id: &str, body: &str) -> Result<()> {
            self.sent
                .lock()
                .unwrap()
                .push((conversation_id.to_string(), body.to_string()));
            Ok(())
        }

        async fn is_member(&self, team: &str, user: &str) -> Result<bool> {
            Ok(self
                .members
                .get(team)
                .is_some_and(|m| m.iter().any(|u| u == user)))
        }
    }

    struct FakeSigner;

    #[async_trait]
    impl CertificateSigner for FakeSigner {
        fn name(&self) -> &str {
            "fake"
        }

        async fn sign(
            &self,
            _ca_key: &Path,
            request: &SigningRequest,
        ) -> teamca_signing::Result<Certificate> {
            if !request.public_key.starts_with("ssh-") {
                return Err(SigningError::InvalidPublicKey("bad key".to_string()));
            }
            let now = Utc::now();
            Ok(Certificate {
                contents: format!("cert {} {}", request.principals.join(","), request.key_id),
                key_id: request.key_id.clone(),
                principals: request.principals.clone(),
                valid_after: now,
                valid_before: now,
            })
        }
    }

    fn message(team: &str, sender: &str, body: &str) -> ChatMessage {
        ChatMessage {
            conversation_id: format!("conv-{}", team),
            team: Some(team.to_string()),
            channel: Some("general".to_string()),
            sender: sender.to_string(),
            body: body.to_string(),
        }
    }

    fn config() -> CaConfig {
        CaConfig {
            teams: vec!["alpha".to_string(), "beta".to_string()],
            ..CaConfig::default()
        }
    }

    fn bot(transport: Arc<FakeTransport>) -> SigningBot {
        SigningBot::new(
            transport,
            Arc::new(FakeSigner),
            Arc::new(StaticIdentity("ca_bot".to_string())),
        )
    }

    fn transport_with_members() -> FakeTransport {
        let mut members = HashMap::new();
        members.insert("alpha".to_string(), vec!["alice".to_string()]);
        members.insert(
            "beta".to_string(),
            vec!["alice".to_string(), "bob".to_string()],
        );
        FakeTransport {
            members,
            ..FakeTransport::default()
        }
    }

    #[tokio::test]
    async fn test_ack() {
        let bot = bot(Arc::new(FakeTransport::default()));
        let reply = bot
            .handle(&config(), &message("alpha", "alice", "AckRequest--xyz"))
            .await
            .unwrap();
        assert_eq!(reply.as_deref(), Some("Ack--xyz"));
    }

    #[tokio::test]
    async fn test_sign_uses_sender_memberships() {
        let bot = bot(Arc::new(transport_with_members()));
        let body = r#"Signature_Request:{"SSHPublicKey":"ssh-ed25519 AAAA","UUID":"u-1"}"#;

        let reply = bot
            .handle(&config(), &message("beta", "bob", body))
            .await
            .unwrap()
            .unwrap();
        let json = reply.strip_prefix("Signature_Response:").unwrap();
        let response: SignatureResponse = serde_json::from_str(json).unwrap();

        assert_eq!(response.uuid, "u-1");
        assert!(response.signed_key.starts_with("cert beta "));
        assert!(response.signed_key.ends_with(":bob"));

        let reply = bot
            .handle(&config(), &message("beta", "alice", body))
            .await
            .unwrap()
            .unwrap();
        assert!(reply.contains("cert alpha,beta "));
    }

    #[tokio::test]
    async fn test_sign_rejects_outsiders() {
        let bot = bot(Arc::new(transport_with_members()));
        let body = r#"Signature_Request:{"SSHPublicKey":"ssh-ed25519 AAAA","UUID":"u-1"}"#;
        let err = bot
            .handle(&config(), &message("alpha", "mallory", body))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(user) if user == "mallory"));
    }

    #[test]
    fn test_accepts_conversations() {
        let mut config = config();
        assert!(SigningBot::accepts(&config, &message("alpha", "a", "")));
        assert!(!SigningBot::accepts(&config, &message("gamma", "a", "")));

        let mut direct = message("alpha", "a", "");
        direct.team = None;
        assert!(!SigningBot::accepts(&config, &direct));

        config.chat_channel = Some("ops#ssh".parse().unwrap());
        assert!(!SigningBot::accepts(&config, &message("alpha", "a", "")));
        let mut ops = message("ops", "a", "");
        assert!(!SigningBot::accepts(&config, &ops));
        ops.channel = Some("ssh".to_string());
        assert!(SigningBot::accepts(&config, &ops));
    }

    #[tokio::test]
    async fn test_run_survives_failed_requests() {
        let transport = Arc::new(transport_with_members());
        {
            let mut incoming = transport.incoming.lock().unwrap();
            incoming.push_back(message("alpha", "alice", "Signature_Request:{broken"));
            incoming.push_back(message(
                "alpha",
                "alice",
                r#"Signature_Request:{"SSHPublicKey":"garbage","UUID":"u-2"}"#,
            ));
            incoming.push_back(message("alpha", "ca_bot", "AckRequest--self"));
            incoming.push_back(message("gamma", "alice", "AckRequest--elsewhere"));
            incoming.push_back(message("alpha", "alice", "AckRequest--ok"));
        }

        let err = bot(transport.clone())
            .run(&config(), CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Transport(_)));

        let sent = transport.sent.lock().unwrap();
        assert_eq!(
            *sent,
            vec![("conv-alpha".to_string(), "Ack--ok".to_string())]
        );
    }

    #[tokio::test]
    async fn test_run_stops_on_cancel() {
        let token = CancellationToken::new();
        token.cancel();
        bot(Arc::new(FakeTransport::default()))
            .run(&config(), token)
            .await
            .unwrap();
    }
}
