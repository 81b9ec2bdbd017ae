use std::path::PathBuf;

use anyhow::{Result, anyhow};
use directories::ProjectDirs;

/// Resolved user-private directories binup works in.
///
/// `config` holds `config.toml`, `cache` the release document and artifact
/// directory, `data` the package database, lock file and installed binaries.
/// The `BINUP_CONFIG_DIR` / `BINUP_CACHE_DIR` / `BINUP_DATA_DIR` environment
/// variables override the platform defaults, which also keeps tests hermetic.
#[derive(Debug, Clone)]
pub struct BinupDirs {
    pub config: PathBuf,
    pub cache: PathBuf,
    pub data: PathBuf,
}

impl BinupDirs {
    pub fn resolve() -> Result<BinupDirs> {
        let proj_dirs = ProjectDirs::from("org", "binup", "binup")
            .ok_or_else(|| anyhow!("could not determine project directories"))?;

        Ok(BinupDirs {
            config: override_or("BINUP_CONFIG_DIR", proj_dirs.config_dir()),
            cache: override_or("BINUP_CACHE_DIR", proj_dirs.cache_dir()),
            data: override_or("BINUP_DATA_DIR", proj_dirs.data_dir()),
        })
    }

    /// Directory installed binaries are copied into.
    pub fn bin_dir(&self) -> PathBuf {
        self.data.join("bin")
    }

    /// Directory shell completion files are copied into.
    pub fn completions_dir(&self) -> PathBuf {
        self.data.join("completions")
    }

    /// Directory man pages are copied into.
    pub fn man_dir(&self) -> PathBuf {
        self.data.join("man")
    }

    pub fn db_file(&self) -> PathBuf {
        self.data.join("packages.json")
    }

    pub fn lock_file(&self) -> PathBuf {
        self.data.join("packages.lock")
    }

    pub fn release_cache_file(&self) -> PathBuf {
        self.cache.join("releases.json")
    }

    pub fn artifact_cache_dir(&self) -> PathBuf {
        self.cache.join("artifacts")
    }

    pub fn config_file(&self) -> PathBuf {
        self.config.join("config.toml")
    }
}

fn override_or(var: &str, default: &std::path::Path) -> PathBuf {
    match std::env::var_os(var) {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => default.to_path_buf(),
    }
}
