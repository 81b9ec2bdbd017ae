use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::github::Release;
use crate::util::write_atomic;

/// Cached upstream metadata for one repository.
///
/// `latest_release` and `last_checked` are only ever written together; a
/// reader never sees one refreshed without the other.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseCacheEntry {
    pub last_checked: DateTime<Utc>,
    pub latest_release: Release,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ReleaseCacheDoc {
    repos: BTreeMap<String, ReleaseCacheEntry>,
}

/// TTL-gated store of release metadata, one JSON document for all repositories.
///
/// A failure to read or parse the document is never an error: `get` degrades
/// to a miss and the next successful `put` rewrites the whole document,
/// repairing it.
pub struct ReleaseCache {
    path: PathBuf,
    ttl_secs: u64,
    bypass: bool,
}

impl ReleaseCache {
    pub fn new(path: PathBuf, ttl_secs: u64, bypass: bool) -> ReleaseCache {
        ReleaseCache {
            path,
            ttl_secs,
            bypass,
        }
    }

    /// Returns the cached release for `repo`, or `None` on a miss.
    ///
    /// Misses: no entry, entry older than the TTL, unreadable or corrupt
    /// document, or the cache being bypassed for this run. Never mutates.
    pub fn get(&self, repo: &str) -> Option<Release> {
        if self.bypass {
            return None;
        }
        let entry = self.load().repos.remove(repo)?;
        let age = Utc::now().signed_duration_since(entry.last_checked);
        if age > Duration::seconds(self.ttl_secs as i64) {
            tracing::debug!(repo, "release cache entry expired");
            return None;
        }
        Some(entry.latest_release)
    }

    /// Replaces the entry for `repo`, stamping `last_checked` with now.
    pub fn put(&self, repo: &str, release: &Release) -> Result<()> {
        let mut doc = self.load();
        doc.repos.insert(
            repo.to_string(),
            ReleaseCacheEntry {
                last_checked: Utc::now(),
                latest_release: release.clone(),
            },
        );
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        write_atomic(&self.path, serde_json::to_string_pretty(&doc)?.as_bytes())
    }

    /// Removes the whole cache document.
    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }

    fn load(&self) -> ReleaseCacheDoc {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(_) => return ReleaseCacheDoc::default(),
        };
        serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!(path = %self.path.display(), error = %e, "release cache unreadable, treating as empty");
            ReleaseCacheDoc::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn release(tag: &str) -> Release {
        Release {
            tag_name: tag.to_string(),
            assets: vec![],
        }
    }

    #[test]
    fn test_put_then_get_within_ttl() {
        let dir = tempdir().unwrap();
        let cache = ReleaseCache::new(dir.path().join("releases.json"), 3600, false);
        cache.put("junegunn/fzf", &release("v0.57.0")).unwrap();
        let hit = cache.get("junegunn/fzf").unwrap();
        assert_eq!(hit.tag_name, "v0.57.0");
    }

    #[test]
    fn test_expired_entry_is_a_miss() {
        let dir = tempdir().unwrap();
        let cache = ReleaseCache::new(dir.path().join("releases.json"), 0, false);
        cache.put("junegunn/fzf", &release("v0.57.0")).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(1100));
        assert!(cache.get("junegunn/fzf").is_none());
    }

    #[test]
    fn test_bypass_is_always_a_miss() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("releases.json");
        ReleaseCache::new(path.clone(), 3600, false)
            .put("junegunn/fzf", &release("v0.57.0"))
            .unwrap();
        let bypassed = ReleaseCache::new(path, 3600, true);
        assert!(bypassed.get("junegunn/fzf").is_none());
    }

    #[test]
    fn test_corrupt_document_is_a_miss_and_put_repairs_it() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("releases.json");
        std::fs::write(&path, "{not json").unwrap();
        let cache = ReleaseCache::new(path, 3600, false);
        assert!(cache.get("junegunn/fzf").is_none());
        cache.put("junegunn/fzf", &release("v0.58.0")).unwrap();
        assert_eq!(cache.get("junegunn/fzf").unwrap().tag_name, "v0.58.0");
    }

    #[test]
    fn test_put_replaces_previous_entry() {
        let dir = tempdir().unwrap();
        let cache = ReleaseCache::new(dir.path().join("releases.json"), 3600, false);
        cache.put("sharkdp/bat", &release("v0.24.0")).unwrap();
        cache.put("sharkdp/bat", &release("v0.25.0")).unwrap();
        assert_eq!(cache.get("sharkdp/bat").unwrap().tag_name, "v0.25.0");
    }
}
