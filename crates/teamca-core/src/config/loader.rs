//! Configuration loading

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{ConfigError, Result};

use super::defaults::config_file_names;
use super::env::apply_env_overrides;
use super::types::CaConfig;
use super::validation::validate_config;

/// Load configuration from a file (TOML or YAML, by extension)
pub fn load_config(path: &Path) -> Result<CaConfig> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let format = if path.extension().is_some_and(|e| e == "toml") {
        "TOML"
    } else {
        "YAML"
    };
    info!(path = %path.display(), format, "loading config");

    let content = std::fs::read_to_string(path)?;

    let config: CaConfig = if format == "TOML" {
        toml::from_str(&content)?
    } else {
        serde_yaml::from_str(&content)?
    };

    debug!(path = %path.display(), "config file parsed");
    Ok(config)
}

/// Find a configuration file in `start_dir` or its parents
pub fn find_config(start_dir: &Path) -> Option<PathBuf> {
    debug!(start_dir = %start_dir.display(), "searching for config file");
    let mut current = start_dir.to_path_buf();

    loop {
        for name in config_file_names() {
            let config_path = current.join(name);
            if config_path.exists() {
                info!(path = %config_path.display(), "found config file");
                return Some(config_path);
            }
        }

        if !current.pop() {
            break;
        }
    }

    debug!("no config file found");
    None
}

/// Build the effective configuration and validate it.
///
/// Precedence: defaults, then the explicit file (or one discovered from
/// `search_dir`), then environment values supplied through `lookup`.
pub fn load_config_from_sources<F>(
    explicit: Option<&Path>,
    search_dir: Option<&Path>,
    lookup: F,
) -> Result<CaConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let file = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => search_dir.and_then(find_config),
    };

    let mut config = match file {
        Some(path) => load_config(&path)?,
        None => {
            debug!("no config file, starting from defaults");
            CaConfig::default()
        }
    };

    apply_env_overrides(&mut config, lookup)?;
    validate_config(&config)?;
    debug!(teams = ?config.teams, "configuration loaded and validated");
    Ok(config)
}

/// Load from the process environment and the working directory
pub fn load_config_from_env(explicit: Option<&Path>) -> Result<CaConfig> {
    let cwd = std::env::current_dir()?;
    load_config_from_sources(explicit, Some(&cwd), |name| std::env::var(name).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_find_config_in_parent() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("teamca.toml");
        std::fs::write(&config_path, "teams = [\"alpha\"]").unwrap();
        let nested = temp.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        assert_eq!(find_config(&nested), Some(config_path));
    }

    #[test]
    fn test_find_config_prefers_toml_over_yaml() {
        let temp = TempDir::new().unwrap();
        let toml_path = temp.path().join("teamca.toml");
        std::fs::write(&toml_path, "teams = [\"alpha\"]").unwrap();
        std::fs::write(temp.path().join("teamca.yaml"), "teams: [beta]").unwrap();

        assert_eq!(find_config(temp.path()).unwrap(), toml_path);
    }

    #[test]
    fn test_load_config_toml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("teamca.toml");
        std::fs::write(
            &path,
            "teams = [\"alpha\", \"beta\"]\nchat_channel = \"ops#ssh\"\nkey_expiration = \"+2h\"\n\n[concurrency]\nmaintenance = 4\n",
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.teams, vec!["alpha", "beta"]);
        assert_eq!(config.channel_name(), "ssh");
        assert_eq!(config.key_expiration(), Duration::from_secs(7200));
        assert_eq!(config.concurrency.maintenance, 4);
        assert_eq!(config.concurrency.distribution, 10);
    }

    #[test]
    fn test_load_config_yaml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("teamca.yaml");
        std::fs::write(&path, "teams:\n  - alpha\nkey_expiration: \"+30m\"\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.teams, vec!["alpha"]);
        assert_eq!(config.key_expiration(), Duration::from_secs(1800));
    }

    #[test]
    fn test_load_config_rejects_bad_expiration() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("teamca.toml");
        std::fs::write(&path, "teams = [\"alpha\"]\nkey_expiration = \"forever\"\n").unwrap();

        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_missing_explicit_file() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope.toml");
        let err = load_config_from_sources(Some(&missing), None, no_env).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_environment_overrides_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("teamca.toml");
        std::fs::write(&path, "teams = [\"alpha\"]\n").unwrap();

        let config = load_config_from_sources(Some(&path), None, |name| {
            (name == "TEAMS").then(|| "beta,gamma".to_string())
        })
        .unwrap();
        assert_eq!(config.teams, vec!["beta", "gamma"]);
    }

    #[test]
    fn test_defaults_without_teams_fail_validation() {
        let temp = TempDir::new().unwrap();
        assert!(load_config_from_sources(None, Some(temp.path()), no_env).is_err());
    }
}
