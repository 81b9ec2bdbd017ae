use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default maximum age of a cached release entry, in seconds.
pub const DEFAULT_TTL_SECS: u64 = 3600;

/// Contents of `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// GitHub API token. Unauthenticated requests share a very low rate limit.
    pub token: Option<String>,
    /// Maximum age of cached release metadata and artifacts, in seconds.
    pub ttl_secs: u64,
    /// Where installed binaries go; defaults to the data dir's `bin/`.
    pub bin_dir: Option<PathBuf>,
    /// When asset selection fails, try `apt-get install <name>` instead.
    pub system_fallback: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            token: None,
            ttl_secs: DEFAULT_TTL_SECS,
            bin_dir: None,
            system_fallback: false,
        }
    }
}

impl Config {
    /// Loads the config file, falling back to defaults when it does not exist.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Config> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("could not read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("invalid config in {}", path.display()))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("could not write {}", path.display()))?;
        Ok(())
    }

    /// The token to authenticate with: config value first, `GITHUB_TOKEN` second.
    pub fn resolved_token(&self) -> Option<String> {
        self.token
            .clone()
            .or_else(|| std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempdir().unwrap();
        let config = Config::load(dir.path().join("config.toml")).unwrap();
        assert_eq!(config.ttl_secs, DEFAULT_TTL_SECS);
        assert!(config.token.is_none());
        assert!(!config.system_fallback);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let config = Config {
            token: Some("ghp_test".to_string()),
            ttl_secs: 60,
            bin_dir: Some(PathBuf::from("/tmp/bin")),
            system_fallback: true,
        };
        config.save(&path).unwrap();
        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.token.as_deref(), Some("ghp_test"));
        assert_eq!(loaded.ttl_secs, 60);
        assert!(loaded.system_fallback);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "ttl_secs = 120\n").unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.ttl_secs, 120);
        assert!(config.token.is_none());
    }
}
