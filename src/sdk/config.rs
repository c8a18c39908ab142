use std::env;
use std::path::PathBuf;

/// Where the key derivation salt comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SaltMode {
    /// A random salt generated on first unlock and stored unencrypted next to the data.
    #[default]
    PerInstallation,
    /// The fixed salt built into early releases. Every installation shares it,
    /// so only use this to open data written by those releases.
    Legacy,
}

/// Settings for opening a [`Workspace`](crate::sdk::Workspace).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub salt_mode: SaltMode,
}

impl Config {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self { data_dir: data_dir.into(), salt_mode: SaltMode::default() }
    }

    /// Builds a config from the environment.
    ///
    /// - `KAIROS_DATA_DIR` replaces `default_dir` when set and non-empty.
    /// - `KAIROS_LEGACY_SALT=true` selects [`SaltMode::Legacy`].
    pub fn from_env(default_dir: &str) -> Self {
        let data_dir = env::var("KAIROS_DATA_DIR")
            .ok()
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| default_dir.to_string());

        let salt_mode = if env::var("KAIROS_LEGACY_SALT").unwrap_or_default() == "true" {
            SaltMode::Legacy
        } else {
            SaltMode::PerInstallation
        };

        Self { data_dir: data_dir.into(), salt_mode }
    }
}
