//! Client config distribution
//!
//! While the CA service is live, every team in the computed team set holds a
//! [`ClientConfigEntry`] at its reserved path telling clients where to send
//! signing requests. The entries are removed again on shutdown.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use teamca_core::CaConfig;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::error::{DirectoryError, Result};
use crate::fanout::for_each_team;
use crate::identity::AccountIdentity;
use crate::paths::client_config_path;
use crate::store::TeamStore;

/// Published per-team metadata read by clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ClientConfigEntry {
    /// Team that receives signing requests
    pub team_name: String,
    /// Account running the CA bot
    pub bot_name: String,
    /// Channel within the team; empty means any channel
    pub channel_name: String,
}

impl ClientConfigEntry {
    /// The entry published into `team`'s namespace
    pub fn for_team(config: &CaConfig, team: &str, bot_name: &str) -> Self {
        match config.chat_team() {
            Some(chat_team) => Self {
                team_name: chat_team.to_string(),
                bot_name: bot_name.to_string(),
                channel_name: config.channel_name().to_string(),
            },
            None => Self {
                team_name: team.to_string(),
                bot_name: bot_name.to_string(),
                channel_name: String::new(),
            },
        }
    }
}

/// Authorized teams plus the chat team when it is not already among them
pub fn computed_team_set(config: &CaConfig) -> Vec<String> {
    let mut teams: Vec<String> = Vec::with_capacity(config.teams().len() + 1);
    for team in config.teams().iter().map(String::as_str).chain(config.chat_team()) {
        if !teams.iter().any(|t| t == team) {
            teams.push(team.to_string());
        }
    }
    teams
}

/// Publishes and retracts client config entries
pub struct ClientConfigDistributor {
    store: Arc<dyn TeamStore>,
    identity: Arc<dyn AccountIdentity>,
    slots: Arc<Semaphore>,
}

impl ClientConfigDistributor {
    /// `limit` caps concurrent store operations and is fixed for the
    /// distributor's lifetime
    pub fn new(
        store: Arc<dyn TeamStore>,
        identity: Arc<dyn AccountIdentity>,
        limit: usize,
    ) -> Self {
        Self {
            store,
            identity,
            slots: Arc::new(Semaphore::new(limit.max(1))),
        }
    }

    /// Write the client config entry for every team in the computed set.
    ///
    /// Existing files are replaced. Every team is attempted; the first
    /// failure in team order is returned.
    pub async fn publish(&self, config: &CaConfig) -> Result<Vec<String>> {
        let bot_name = self.identity.username().await?;
        let teams = computed_team_set(config);

        let mut payloads = HashMap::with_capacity(teams.len());
        for team in &teams {
            let entry = ClientConfigEntry::for_team(config, team, &bot_name);
            payloads.insert(team.clone(), serde_json::to_vec(&entry)?);
        }
        let payloads = Arc::new(payloads);

        let store = self.store.clone();
        let results = for_each_team(teams.clone(), self.slots.clone(), move |team| {
            let store = store.clone();
            let payloads = payloads.clone();
            async move {
                let payload = payload_for(&payloads, &team)?;
                store.write(&client_config_path(&team), payload).await
            }
        })
        .await;

        first_error(&teams, results)?;
        info!(target: "teamca::audit", teams = ?teams, bot = %bot_name, "published client configs");
        Ok(teams)
    }

    /// Delete the client config entry for every team in the computed set.
    ///
    /// Entries that are already gone count as retracted. Every team is
    /// attempted; the first failure in team order is returned.
    pub async fn retract(&self, config: &CaConfig) -> Result<Vec<String>> {
        let teams = computed_team_set(config);

        let store = self.store.clone();
        let results = for_each_team(teams.clone(), self.slots.clone(), move |team| {
            let store = store.clone();
            async move {
                match store.delete(&client_config_path(&team)).await {
                    Err(e) if e.is_not_found() => {
                        debug!(team = %team, "client config already absent");
                        Ok(())
                    }
                    other => other,
                }
            }
        })
        .await;

        first_error(&teams, results)?;
        info!(target: "teamca::audit", teams = ?teams, "retracted client configs");
        Ok(teams)
    }
}

/// Log every failure and surface the one belonging to the earliest team
fn first_error(teams: &[String], results: Vec<(String, Result<()>)>) -> Result<()> {
    let mut failures: Vec<(usize, DirectoryError)> = results
        .into_iter()
        .filter_map(|(team, result)| {
            result.err().map(|e| {
                warn!(team = %team, error = %e, "client config operation failed");
                let index = teams.iter().position(|t| *t == team).unwrap_or(usize::MAX);
                (index, e)
            })
        })
        .collect();

    failures.sort_by_key(|(index, _)| *index);
    match failures.into_iter().next() {
        Some((_, e)) => Err(e),
        None => Ok(()),
    }
}

/// Serialized entry for `team`; a miss means the fan-out and the computed
/// team set disagree
fn payload_for<'a>(payloads: &'a HashMap<String, Vec<u8>>, team: &str) -> Result<&'a [u8]> {
    payloads
        .get(team)
        .map(Vec::as_slice)
        .ok_or_else(|| DirectoryError::TaskFailed {
            team: team.to_string(),
            reason: "no client config entry was built for this team".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::StaticIdentity;
    use crate::paths::TEAM_ROOT;
    use crate::store::MemoryStore;
    use async_trait::async_trait;

    fn config(teams: &[&str], chat: Option<&str>) -> CaConfig {
        CaConfig {
            teams: teams.iter().map(|t| t.to_string()).collect(),
            chat_channel: chat.map(|c| c.parse().unwrap()),
            ..CaConfig::default()
        }
    }

    fn distributor(store: Arc<dyn TeamStore>) -> ClientConfigDistributor {
        ClientConfigDistributor::new(store, Arc::new(StaticIdentity("ca_bot".to_string())), 2)
    }

    async fn entry(store: &MemoryStore, team: &str) -> ClientConfigEntry {
        let bytes = store.read(&client_config_path(team)).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_entry_json_field_names() {
        let entry = ClientConfigEntry {
            team_name: "alpha".to_string(),
            bot_name: "ca_bot".to_string(),
            channel_name: String::new(),
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(
            json,
            r#"{"TeamName":"alpha","BotName":"ca_bot","ChannelName":""}"#
        );
    }

    #[test]
    fn test_computed_team_set() {
        assert_eq!(computed_team_set(&config(&["a", "b"], None)), vec!["a", "b"]);
        assert_eq!(
            computed_team_set(&config(&["a", "b"], Some("chat#ssh"))),
            vec!["a", "b", "chat"]
        );
        assert_eq!(
            computed_team_set(&config(&["a", "b"], Some("b#ssh"))),
            vec!["a", "b"]
        );
        assert_eq!(computed_team_set(&config(&[], Some("chat"))), vec!["chat"]);
    }

    #[tokio::test]
    async fn test_publish_without_override_points_each_team_at_itself() {
        let store = Arc::new(MemoryStore::with_teams(["alpha", "beta"]));
        let config = config(&["alpha", "beta"], None);

        distributor(store.clone()).publish(&config).await.unwrap();

        for team in ["alpha", "beta"] {
            let entry = entry(&store, team).await;
            assert_eq!(entry.team_name, team);
            assert_eq!(entry.bot_name, "ca_bot");
            assert_eq!(entry.channel_name, "");
        }
    }

    #[tokio::test]
    async fn test_publish_with_override_points_every_team_at_chat_team() {
        let store = Arc::new(MemoryStore::with_teams(["alpha", "beta", "ops"]));
        let config = config(&["alpha", "beta"], Some("ops#ssh-requests"));

        let teams = distributor(store.clone()).publish(&config).await.unwrap();
        assert_eq!(teams, vec!["alpha", "beta", "ops"]);

        for team in ["alpha", "beta", "ops"] {
            let entry = entry(&store, team).await;
            assert_eq!(entry.team_name, "ops");
            assert_eq!(entry.channel_name, "ssh-requests");
        }
    }

    #[tokio::test]
    async fn test_publish_overwrites_existing_entry() {
        let store = Arc::new(MemoryStore::with_teams(["alpha"]));
        store
            .write(&client_config_path("alpha"), b"{\"stale\":true}")
            .await
            .unwrap();

        distributor(store.clone())
            .publish(&config(&["alpha"], None))
            .await
            .unwrap();
        assert_eq!(entry(&store, "alpha").await.team_name, "alpha");
    }

    #[tokio::test]
    async fn test_publish_then_retract_leaves_nothing() {
        let store = Arc::new(MemoryStore::with_teams(["alpha", "beta", "ops"]));
        let config = config(&["alpha", "beta"], Some("ops"));
        let distributor = distributor(store.clone());

        distributor.publish(&config).await.unwrap();
        assert_eq!(store.paths().await.len(), 3);

        distributor.retract(&config).await.unwrap();
        assert!(store.paths().await.is_empty());
        for team in store.list(TEAM_ROOT).await.unwrap() {
            assert!(!store.exists(&client_config_path(&team)).await.unwrap());
        }
    }

    #[tokio::test]
    async fn test_retract_tolerates_missing_entries() {
        let store = Arc::new(MemoryStore::with_teams(["alpha"]));
        distributor(store)
            .retract(&config(&["alpha"], None))
            .await
            .unwrap();
    }

    /// Fails every delete for one team
    struct FailingDeletes {
        inner: MemoryStore,
        broken: &'static str,
    }

    #[async_trait]
    impl TeamStore for FailingDeletes {
        fn name(&self) -> &str {
            "failing"
        }
        async fn list(&self, prefix: &str) -> Result<Vec<String>> {
            self.inner.list(prefix).await
        }
        async fn exists(&self, path: &str) -> Result<bool> {
            self.inner.exists(path).await
        }
        async fn read(&self, path: &str) -> Result<Vec<u8>> {
            self.inner.read(path).await
        }
        async fn write(&self, path: &str, data: &[u8]) -> Result<()> {
            self.inner.write(path, data).await
        }
        async fn delete(&self, path: &str) -> Result<()> {
            if path == client_config_path(self.broken) {
                return Err(DirectoryError::Command {
                    command: format!("rm {}", path),
                    status: 1,
                    stderr: "permission denied".to_string(),
                });
            }
            self.inner.delete(path).await
        }
    }

    #[tokio::test]
    async fn test_retract_attempts_every_team_and_reports_failure() {
        let store = Arc::new(FailingDeletes {
            inner: MemoryStore::with_teams(["alpha", "beta", "gamma"]),
            broken: "beta",
        });
        let config = config(&["alpha", "beta", "gamma"], None);
        let distributor = distributor(store.clone());

        distributor.publish(&config).await.unwrap();
        let err = distributor.retract(&config).await.unwrap_err();
        assert!(err.to_string().contains("permission denied"));

        let remaining = store.inner.paths().await;
        assert_eq!(remaining, vec![client_config_path("beta")]);
    }

    #[test]
    fn test_payload_for_unknown_team_is_an_error() {
        let mut payloads = HashMap::new();
        payloads.insert("alpha".to_string(), b"{}".to_vec());

        assert_eq!(payload_for(&payloads, "alpha").unwrap(), b"{}");
        let err = payload_for(&payloads, "beta").unwrap_err();
        assert!(matches!(err, DirectoryError::TaskFailed { team, .. } if team == "beta"));
    }
}
