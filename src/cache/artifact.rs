use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

/// Artifacts untouched for this long are deleted by the janitor sweep,
/// whether or not a newer artifact ever superseded them.
const SWEEP_MAX_AGE: Duration = Duration::from_secs(30 * 24 * 3600);

/// Sidecar written next to each cached archive.
#[derive(Debug, Serialize, Deserialize)]
struct ArtifactMeta {
    url: String,
}

/// Store of downloaded release archives, at most one retained per repository.
///
/// The workload is "one current release artifact per tracked project", so
/// retention is replace-on-new-artifact per repository rather than any global
/// LRU; historical artifacts are explicitly not worth keeping. A hit requires
/// the recorded source URL to match the URL being requested and the file to be
/// younger than the TTL.
pub struct ArtifactCache {
    root: PathBuf,
    ttl_secs: u64,
    bypass: bool,
}

impl ArtifactCache {
    /// Opens the cache and runs the age sweep once.
    pub fn open(root: PathBuf, ttl_secs: u64, bypass: bool) -> Result<ArtifactCache> {
        std::fs::create_dir_all(&root)
            .with_context(|| format!("could not create cache dir {}", root.display()))?;
        let cache = ArtifactCache {
            root,
            ttl_secs,
            bypass,
        };
        let swept = cache.sweep()?;
        if swept > 0 {
            tracing::info!(swept, "removed stale cached artifacts");
        }
        Ok(cache)
    }

    /// Returns the cached archive for `repo`/`filename` if it is still valid.
    ///
    /// `expected_url` guards against an upstream release re-using a filename:
    /// a cached file fetched from a different URL is a miss.
    pub fn get(&self, repo: &str, filename: &str, expected_url: &str) -> Option<PathBuf> {
        if self.bypass {
            return None;
        }
        let path = self.repo_dir(repo).join(filename);
        if !path.is_file() {
            return None;
        }
        let meta = std::fs::read_to_string(meta_path(&path)).ok()?;
        let meta: ArtifactMeta = serde_json::from_str(&meta).ok()?;
        if meta.url != expected_url {
            tracing::debug!(repo, filename, "cached artifact URL mismatch");
            return None;
        }
        let age = std::fs::metadata(&path)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|mtime| mtime.elapsed().ok())?;
        if age > Duration::from_secs(self.ttl_secs) {
            return None;
        }
        Some(path)
    }

    /// Copies `source` into the cache, removing every other artifact
    /// previously associated with `repo`.
    pub fn put(&self, repo: &str, filename: &str, url: &str, source: &Path) -> Result<PathBuf> {
        let dir = self.repo_dir(repo);
        if dir.exists() {
            std::fs::remove_dir_all(&dir)
                .with_context(|| format!("could not clear {}", dir.display()))?;
        }
        std::fs::create_dir_all(&dir)?;
        let dest = dir.join(filename);
        std::fs::copy(source, &dest)
            .with_context(|| format!("could not cache {}", dest.display()))?;
        let meta = ArtifactMeta {
            url: url.to_string(),
        };
        std::fs::write(meta_path(&dest), serde_json::to_string(&meta)?)?;
        Ok(dest)
    }

    /// Deletes cached archives untouched for more than 30 days, together with
    /// their sidecars. Returns how many archives were removed.
    pub fn sweep(&self) -> Result<usize> {
        let mut removed = 0;
        for entry in WalkDir::new(&self.root).min_depth(2) {
            let entry = entry?;
            if !entry.file_type().is_file() || is_meta(entry.path()) {
                continue;
            }
            let age = entry
                .metadata()?
                .modified()
                .ok()
                .and_then(|mtime| mtime.elapsed().ok());
            if matches!(age, Some(age) if age > SWEEP_MAX_AGE) {
                std::fs::remove_file(entry.path())?;
                let _ = std::fs::remove_file(meta_path(entry.path()));
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Wipes the whole artifact directory and recreates it empty.
    pub fn clear(&self) -> Result<()> {
        if self.root.exists() {
            std::fs::remove_dir_all(&self.root)?;
        }
        std::fs::create_dir_all(&self.root)?;
        Ok(())
    }

    // Nested owner/name layout; flattening the slash would let
    // "a/b-c" and "a-b/c" evict each other.
    fn repo_dir(&self, repo: &str) -> PathBuf {
        repo.split('/').fold(self.root.clone(), |dir, part| dir.join(part))
    }
}

fn meta_path(artifact: &Path) -> PathBuf {
    let mut name = artifact.file_name().unwrap_or_default().to_os_string();
    name.push(".meta.json");
    artifact.with_file_name(name)
}

fn is_meta(path: &Path) -> bool {
    path.to_string_lossy().ends_with(".meta.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn put_fixture(cache: &ArtifactCache, repo: &str, filename: &str, url: &str) -> PathBuf {
        let staging = tempdir().unwrap();
        let source = staging.path().join(filename);
        std::fs::write(&source, b"archive bytes").unwrap();
        cache.put(repo, filename, url, &source).unwrap()
    }

    #[test]
    fn test_put_then_get() {
        let dir = tempdir().unwrap();
        let cache = ArtifactCache::open(dir.path().join("artifacts"), 3600, false).unwrap();
        let cached = put_fixture(&cache, "junegunn/fzf", "fzf.tar.gz", "https://x/fzf.tar.gz");
        let hit = cache
            .get("junegunn/fzf", "fzf.tar.gz", "https://x/fzf.tar.gz")
            .unwrap();
        assert_eq!(hit, cached);
    }

    #[test]
    fn test_url_mismatch_is_a_miss() {
        let dir = tempdir().unwrap();
        let cache = ArtifactCache::open(dir.path().join("artifacts"), 3600, false).unwrap();
        put_fixture(&cache, "junegunn/fzf", "fzf.tar.gz", "https://x/v1/fzf.tar.gz");
        assert!(
            cache
                .get("junegunn/fzf", "fzf.tar.gz", "https://x/v2/fzf.tar.gz")
                .is_none()
        );
    }

    #[test]
    fn test_put_retains_a_single_artifact_per_repo() {
        let dir = tempdir().unwrap();
        let cache = ArtifactCache::open(dir.path().join("artifacts"), 3600, false).unwrap();
        put_fixture(&cache, "junegunn/fzf", "fzf-0.56.tar.gz", "https://x/a");
        put_fixture(&cache, "junegunn/fzf", "fzf-0.57.tar.gz", "https://x/b");

        let files: Vec<_> = std::fs::read_dir(dir.path().join("artifacts/junegunn/fzf"))
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .filter(|name| !name.ends_with(".meta.json"))
            .collect();
        assert_eq!(files, vec!["fzf-0.57.tar.gz"]);
    }

    #[test]
    fn test_repos_do_not_evict_each_other() {
        let dir = tempdir().unwrap();
        let cache = ArtifactCache::open(dir.path().join("artifacts"), 3600, false).unwrap();
        put_fixture(&cache, "junegunn/fzf", "fzf.tar.gz", "https://x/fzf");
        put_fixture(&cache, "sharkdp/bat", "bat.tar.gz", "https://x/bat");
        assert!(cache.get("junegunn/fzf", "fzf.tar.gz", "https://x/fzf").is_some());
        assert!(cache.get("sharkdp/bat", "bat.tar.gz", "https://x/bat").is_some());
    }

    #[test]
    fn test_similar_repo_names_get_distinct_dirs() {
        let dir = tempdir().unwrap();
        let cache = ArtifactCache::open(dir.path().join("artifacts"), 3600, false).unwrap();
        put_fixture(&cache, "a/b-c", "tool.tar.gz", "https://x/bc");
        put_fixture(&cache, "a-b/c", "tool.tar.gz", "https://x/c");
        assert!(cache.get("a/b-c", "tool.tar.gz", "https://x/bc").is_some());
        assert!(cache.get("a-b/c", "tool.tar.gz", "https://x/c").is_some());
    }

    #[test]
    fn test_sweep_removes_old_artifacts_and_sidecars() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("artifacts");
        let cache = ArtifactCache::open(root.clone(), u64::MAX, false).unwrap();
        let old = put_fixture(&cache, "junegunn/fzf", "fzf.tar.gz", "https://x/fzf");
        put_fixture(&cache, "sharkdp/bat", "bat.tar.gz", "https://x/bat");

        let backdated = std::time::SystemTime::now() - SWEEP_MAX_AGE - Duration::from_secs(3600);
        let file = std::fs::File::options().write(true).open(&old).unwrap();
        file.set_times(std::fs::FileTimes::new().set_modified(backdated))
            .unwrap();

        let reopened = ArtifactCache::open(root, u64::MAX, false).unwrap();
        assert!(!old.exists());
        assert!(!meta_path(&old).exists());
        assert!(
            reopened
                .get("sharkdp/bat", "bat.tar.gz", "https://x/bat")
                .is_some()
        );
    }

    #[test]
    fn test_bypass_is_always_a_miss() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("artifacts");
        let cache = ArtifactCache::open(root.clone(), 3600, false).unwrap();
        put_fixture(&cache, "junegunn/fzf", "fzf.tar.gz", "https://x/fzf");
        let bypassed = ArtifactCache::open(root, 3600, true).unwrap();
        assert!(
            bypassed
                .get("junegunn/fzf", "fzf.tar.gz", "https://x/fzf")
                .is_none()
        );
    }

    #[test]
    fn test_clear_empties_the_cache() {
        let dir = tempdir().unwrap();
        let cache = ArtifactCache::open(dir.path().join("artifacts"), 3600, false).unwrap();
        put_fixture(&cache, "junegunn/fzf", "fzf.tar.gz", "https://x/fzf");
        cache.clear().unwrap();
        assert!(
            cache
                .get("junegunn/fzf", "fzf.tar.gz", "https://x/fzf")
                .is_none()
        );
    }
}
