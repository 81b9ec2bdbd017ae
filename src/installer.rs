use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use walkdir::WalkDir;

use crate::assets::{HostArch, select_asset};
use crate::cache::{ArtifactCache, ReleaseCache};
use crate::config::Config;
use crate::db::{PackageDb, PackageRecord};
use crate::dirs::BinupDirs;
use crate::download::download_to;
use crate::extract::extract_archive;
use crate::github::{Release, fetch_latest_release, package_name};
use crate::lock::DbLock;
use crate::sysman::SystemPackageManager;
use crate::util::{ExtraFile, classify_extra_file, find_binary, make_executable};
use crate::version;

/// Everything one invocation's batch shares. The lock member is proof the
/// advisory lock was taken before any repository is processed.
pub struct InstallContext<'a> {
    pub dirs: &'a BinupDirs,
    pub config: &'a Config,
    pub release_cache: &'a ReleaseCache,
    pub artifact_cache: &'a ArtifactCache,
    pub db: &'a PackageDb,
    pub lock: &'a DbLock,
    pub arch: HostArch,
    pub sysman: Option<&'a dyn SystemPackageManager>,
}

/// What happened to one repository of the batch.
#[derive(Debug, PartialEq)]
pub enum Outcome {
    Installed { version: String },
    Updated { from: String, to: String },
    UpToDate { version: String },
    /// No suitable binary asset, handed to the system package manager.
    SystemInstalled,
    Skipped { reason: String },
}

/// Processes each repository to completion in order, one at a time.
///
/// A failed repository is recorded as skipped and the batch continues; the
/// result map is the only channel results travel through.
pub fn install_repos(repos: &[String], ctx: &InstallContext) -> BTreeMap<String, Outcome> {
    let mut results = BTreeMap::new();
    for repo in repos {
        let name = package_name(repo).to_string();
        let outcome = install_repo(repo, ctx).unwrap_or_else(|e| {
            let reason = format!("{:#}", e);
            tracing::warn!(repo, error = %reason, "skipping repository");
            Outcome::Skipped { reason }
        });
        results.insert(name, outcome);
    }
    results
}

/// fetch -> select -> download -> install -> record, for one repository.
fn install_repo(repo: &str, ctx: &InstallContext) -> Result<Outcome> {
    let name = package_name(repo);

    let release = match ctx.release_cache.get(repo) {
        Some(release) => release,
        None => {
            let fetched = fetch_latest_release(repo, ctx.config.resolved_token().as_deref())
                .with_context(|| format!("could not fetch latest release of {}", repo))?;
            if let Err(e) = ctx.release_cache.put(repo, &fetched) {
                tracing::warn!(repo, error = %e, "could not update release cache");
            }
            fetched
        }
    };

    let candidate = version::normalized(&release.tag_name);
    let prior = ctx.db.read(name)?;
    if let Some(prior) = &prior {
        if !version::is_newer(&candidate, &prior.version) {
            return Ok(Outcome::UpToDate {
                version: prior.version.clone(),
            });
        }
    }

    let Some(asset) = select_asset(&release.assets, ctx.arch) else {
        return no_binary_outcome(name, &release, ctx);
    };

    let archive = match ctx
        .artifact_cache
        .get(repo, &asset.name, &asset.browser_download_url)
    {
        Some(path) => {
            tracing::debug!(repo, asset = %asset.name, "using cached artifact");
            path
        }
        None => {
            let staging = tempfile::tempdir()?;
            let downloaded = staging.path().join(&asset.name);
            download_to(&asset.browser_download_url, &downloaded)?;
            ctx.artifact_cache
                .put(repo, &asset.name, &asset.browser_download_url, &downloaded)?
        }
    };

    let extracted = tempfile::tempdir()?;
    extract_archive(&archive, extracted.path())?;
    let files = install_files(name, extracted.path(), ctx)?;

    let now = Utc::now();
    let record = PackageRecord {
        repo: repo.to_string(),
        version: candidate.clone(),
        files,
        installed_at: prior.as_ref().map(|p| p.installed_at).unwrap_or(now),
        updated_at: now,
    };
    ctx.db.write(ctx.lock, name, record)?;

    Ok(match prior {
        Some(prior) => Outcome::Updated {
            from: prior.version,
            to: candidate,
        },
        None => Outcome::Installed { version: candidate },
    })
}

fn no_binary_outcome(name: &str, release: &Release, ctx: &InstallContext) -> Result<Outcome> {
    tracing::info!(
        name,
        tag = %release.tag_name,
        assets = release.assets.len(),
        "release ships no suitable binary for this host"
    );
    if ctx.config.system_fallback {
        if let Some(sysman) = ctx.sysman {
            sysman
                .install(name)
                .with_context(|| format!("{} fallback failed", sysman.label()))?;
            return Ok(Outcome::SystemInstalled);
        }
    }
    Ok(Outcome::Skipped {
        reason: "no suitable binary asset for this host".to_string(),
    })
}

/// Copies the binary (plus any completion files and man pages) out of the
/// extracted tree. Returns the created paths, binary first.
fn install_files(name: &str, extracted: &std::path::Path, ctx: &InstallContext) -> Result<Vec<PathBuf>> {
    let bin_dir = ctx
        .config
        .bin_dir
        .clone()
        .unwrap_or_else(|| ctx.dirs.bin_dir());
    std::fs::create_dir_all(&bin_dir)?;

    let binary = find_binary(extracted, name)?;
    let dest = bin_dir.join(name);
    std::fs::copy(&binary, &dest)
        .with_context(|| format!("could not install {}", dest.display()))?;
    make_executable(&dest)?;
    let mut files = vec![dest];

    for entry in WalkDir::new(extracted) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy().to_string();
        let target_dir = match classify_extra_file(&file_name) {
            Some(ExtraFile::ShellCompletion) => ctx.dirs.completions_dir(),
            Some(ExtraFile::ManPage) => ctx.dirs.man_dir(),
            None => continue,
        };
        std::fs::create_dir_all(&target_dir)?;
        let dest = target_dir.join(&file_name);
        std::fs::copy(entry.path(), &dest)?;
        files.push(dest);
    }
    Ok(files)
}

/// Removes a package's files and its store entry. Missing files are reported
/// in the log but do not block removal of the rest.
pub fn remove_package(db: &PackageDb, lock: &DbLock, name: &str) -> Result<bool> {
    let Some(record) = db.read(name)? else {
        return Ok(false);
    };
    for file in &record.files {
        if file.exists() {
            std::fs::remove_file(file)
                .with_context(|| format!("could not remove {}", file.display()))?;
        } else {
            tracing::warn!(path = %file.display(), "recorded file already gone");
        }
    }
    db.delete(lock, name)?;
    Ok(true)
}
