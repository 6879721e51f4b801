//! Chat transport backed by the keybase CLI
//!
//! Incoming messages come from a long-lived `keybase chat api-listen`
//! process; replies and membership lookups go through `keybase chat api`
//! and `keybase team api`.

use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::process::{Child, ChildStdout, Command};
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::{ChatMessage, ChatTransport};
use crate::error::{Result, ServiceError};

struct Listener {
    // Held so the listener is killed when the transport is dropped
    _child: Child,
    lines: Lines<BufReader<ChildStdout>>,
}

/// Chat transport driven by the keybase CLI
pub struct KeybaseChatTransport {
    binary: String,
    listener: Mutex<Option<Listener>>,
}

#[derive(Deserialize)]
struct ListenEvent {
    #[serde(rename = "type")]
    kind: String,
    msg: Option<EventMessage>,
}

#[derive(Deserialize)]
struct EventMessage {
    conversation_id: String,
    channel: EventChannel,
    sender: EventSender,
    content: EventContent,
}

#[derive(Deserialize)]
struct EventChannel {
    name: String,
    #[serde(default)]
    members_type: String,
    topic_name: Option<String>,
}

#[derive(Deserialize)]
struct EventSender {
    username: String,
}

#[derive(Deserialize)]
struct EventContent {
    #[serde(rename = "type")]
    kind: String,
    text: Option<EventText>,
}

#[derive(Deserialize)]
struct EventText {
    body: String,
}

/// Turn one `api-listen` line into a text message, skipping everything else
fn parse_event(line: &str) -> Option<ChatMessage> {
    let event: ListenEvent = match serde_json::from_str(line) {
        Ok(event) => event,
        Err(e) => {
            debug!(error = %e, "skipping unparseable chat event");
            return None;
        }
    };
    if event.kind != "chat" {
        return None;
    }
    let msg = event.msg?;
    if msg.content.kind != "text" {
        return None;
    }
    let body = msg.content.text?.body;

    let is_team = msg.channel.members_type == "team";
    Some(ChatMessage {
        conversation_id: msg.conversation_id,
        team: is_team.then(|| msg.channel.name.clone()),
        channel: if is_team { msg.channel.topic_name } else { None },
        sender: msg.sender.username,
        body,
    })
}

/// Every username listed under `result.members` of a team api response
fn member_names(response: &Value) -> Vec<String> {
    response
        .pointer("/result/members")
        .and_then(Value::as_object)
        .map(|roles| {
            roles
                .values()
                .filter_map(Value::as_array)
                .flatten()
                .filter_map(|m| m.get("username").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

impl KeybaseChatTransport {
    /// Drive the given keybase binary
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            listener: Mutex::new(None),
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }

    fn spawn_error(&self, e: std::io::Error) -> ServiceError {
        if e.kind() == std::io::ErrorKind::NotFound {
            ServiceError::Transport(format!("{} not found; install keybase", self.binary))
        } else {
            ServiceError::Io(e)
        }
    }

    /// Run a JSON api subcommand (`chat api`, `team api`) and parse its reply
    async fn api(&self, subcommand: &str, request: &Value) -> Result<Value> {
        let payload = request.to_string();
        debug!("Running {} {} api", self.binary, subcommand);

        let output = self
            .command()
            .args([subcommand, "api", "-m", &payload])
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            return Err(ServiceError::Transport(format!(
                "{} {} api failed: {}",
                self.binary,
                subcommand,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let response: Value = serde_json::from_slice(&output.stdout)?;
        if let Some(error) = response.get("error") {
            return Err(ServiceError::Transport(error.to_string()));
        }
        Ok(response)
    }

    fn start_listener(&self) -> Result<Listener> {
        let mut child = self
            .command()
            .args(["chat", "api-listen"])
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ServiceError::Transport("chat listener has no stdout".to_string()))?;

        Ok(Listener {
            _child: child,
            lines: BufReader::new(stdout).lines(),
        })
    }
}

#[async_trait]
impl ChatTransport for KeybaseChatTransport {
    async fn next_message(&self) -> Result<Option<ChatMessage>> {
        let mut guard = self.listener.lock().await;
        if guard.is_none() {
            *guard = Some(self.start_listener()?);
        }
        let Some(listener) = guard.as_mut() else {
            return Ok(None);
        };

        while let Some(line) = listener.lines.next_line().await? {
            if let Some(message) = parse_event(&line) {
                return Ok(Some(message));
            }
        }

        warn!("chat listener closed its output");
        *guard = None;
        Ok(None)
    }

    #[instrument(skip(self, body))]
    async fn send(&self, conversation_id: &str, body: &str) -> Result<()> {
        let request = json!({
            "method": "send",
            "params": {
                "options": {
                    "conversation_id": conversation_id,
                    "message": { "body": body },
                }
            }
        });
        self.api("chat", &request).await?;
        Ok(())
    }

    async fn is_member(&self, team: &str, user: &str) -> Result<bool> {
        let request = json!({
            "method": "list-team-memberships",
            "params": { "options": { "team": team } }
        });
        let response = self.api("team", &request).await?;
        Ok(member_names(&response).iter().any(|name| name == user))
    }
}
