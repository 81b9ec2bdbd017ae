use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::lock::DbLock;
use crate::util::write_atomic;

/// What the store knows about one installed package.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PackageRecord {
    /// The `owner/name` repository this package is tracked from.
    pub repo: String,
    /// Installed version, normalized (no leading `v`).
    pub version: String,
    /// Absolute paths created by the install: binary first, then any
    /// completion files and man pages. Non-empty after a successful install.
    pub files: Vec<PathBuf>,
    pub installed_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct DbDoc {
    packages: BTreeMap<String, PackageRecord>,
}

/// Durable record of installed packages, one JSON document keyed by name.
///
/// Reads need no lock. Every mutation takes a `&DbLock` so holding the
/// advisory lock is enforced at the type level, and goes through a full
/// read-modify-write with an atomic rename: a crash mid-write leaves the
/// previous document untouched (the orphaned temp file is simply ignored).
/// The prior document is kept next to the store as a `.bak` copy.
pub struct PackageDb {
    path: PathBuf,
}

impl PackageDb {
    pub fn open<P: AsRef<Path>>(path: P) -> PackageDb {
        PackageDb {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn read(&self, name: &str) -> Result<Option<PackageRecord>> {
        Ok(self.load()?.packages.remove(name))
    }

    pub fn list(&self) -> Result<BTreeMap<String, PackageRecord>> {
        Ok(self.load()?.packages)
    }

    /// Inserts or wholesale-replaces the record for `name`.
    pub fn write(&self, _lock: &DbLock, name: &str, record: PackageRecord) -> Result<()> {
        let mut doc = self.load()?;
        doc.packages.insert(name.to_string(), record);
        self.store(&doc)
    }

    /// Removes the record for `name`; returns whether it existed.
    pub fn delete(&self, _lock: &DbLock, name: &str) -> Result<bool> {
        let mut doc = self.load()?;
        let existed = doc.packages.remove(name).is_some();
        if existed {
            self.store(&doc)?;
        }
        Ok(existed)
    }

    fn load(&self) -> Result<DbDoc> {
        if !self.path.exists() {
            return Ok(DbDoc::default());
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("could not read {}", self.path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("package database {} is corrupt", self.path.display()))
    }

    fn store(&self, doc: &DbDoc) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        if self.path.exists() {
            std::fs::copy(&self.path, self.backup_path())
                .with_context(|| "could not back up package database")?;
        }
        write_atomic(&self.path, serde_json::to_string_pretty(doc)?.as_bytes())
    }

    fn backup_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".bak");
        self.path.with_file_name(name)
    }
}
