//! Online check that the CA account can reach every team it serves

use teamca_core::CaConfig;
use tracing::debug;

use crate::client_config::computed_team_set;
use crate::error::{DirectoryError, Result};
use crate::paths::team_dir;
use crate::store::TeamStore;

/// Fail with [`DirectoryError::TeamNotAccessible`] for the first configured
/// team (or chat team) whose namespace the store does not expose
pub async fn verify_team_access(store: &dyn TeamStore, config: &CaConfig) -> Result<()> {
    for team in computed_team_set(config) {
        if !store.exists(&team_dir(&team)).await? {
            return Err(DirectoryError::TeamNotAccessible { team });
        }
        debug!(team = %team, "team is accessible");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_verify_team_access() {
        let store = MemoryStore::with_teams(["alpha", "ops"]);
        let mut config = CaConfig {
            teams: vec!["alpha".to_string()],
            chat_channel: Some("ops#ssh".parse().unwrap()),
            ..CaConfig::default()
        };
        verify_team_access(&store, &config).await.unwrap();

        config.teams.push("beta".to_string());
        let err = verify_team_access(&store, &config).await.unwrap_err();
        assert!(matches!(err, DirectoryError::TeamNotAccessible { team } if team == "beta"));
    }
}
