//! Default configuration values

/// Default location of the CA private key
pub const DEFAULT_CA_KEY_LOCATION: &str = "/mnt/keybase-ca-key";

/// Default certificate lifetime
pub const DEFAULT_KEY_EXPIRATION: &str = "+1h";

/// Default keybase CLI binary
pub const DEFAULT_KEYBASE_BINARY: &str = "keybase";

/// Default fan-out limit for store-wide operations
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Default configuration file name (TOML)
pub const DEFAULT_CONFIG_TOML: &str = "teamca.toml";

/// Default configuration file name (YAML)
pub const DEFAULT_CONFIG_YAML: &str = "teamca.yaml";

/// Get list of config file names to search for
pub fn config_file_names() -> Vec<&'static str> {
    vec![
        DEFAULT_CONFIG_TOML,
        DEFAULT_CONFIG_YAML,
        ".teamca.toml",
        ".teamca.yaml",
    ]
}
