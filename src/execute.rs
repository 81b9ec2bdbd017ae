use anyhow::{Result, bail};
use colored::Colorize;

use binup::assets::HostArch;
use binup::cache::{ArtifactCache, ReleaseCache};
use binup::config::Config;
use binup::db::PackageDb;
use binup::deps::{DependencyInspector, LddInspector, Linkage};
use binup::dirs::BinupDirs;
use binup::installer::{InstallContext, Outcome, install_repos, remove_package};
use binup::lock::DbLock;
use binup::sysman::AptGet;
use binup::verify::{PackageHealth, assess};

use crate::cli::{BinupCommand, CLI};

pub fn execute(cli: CLI) -> Result<()> {
    let dirs = BinupDirs::resolve()?;
    let config = Config::load(dirs.config_file())?;
    match cli.command {
        BinupCommand::Install { repos } => execute_install(&dirs, &config, repos, cli.fresh),
        BinupCommand::List { verbose } => execute_list(&dirs, verbose),
        BinupCommand::Status { name } => execute_status(&dirs, &name),
        BinupCommand::Remove { name } => execute_remove(&dirs, &name),
        BinupCommand::Clean => execute_clean(&dirs, &config),
    }
}

pub fn execute_install(
    dirs: &BinupDirs,
    config: &Config,
    repos: Vec<String>,
    fresh: bool,
) -> Result<()> {
    // taken before anything else; a live competing process aborts the run
    let lock = DbLock::acquire(&dirs.lock_file())?;
    let db = PackageDb::open(dirs.db_file());

    let repos = if repos.is_empty() {
        db.list()?
            .into_values()
            .map(|record| record.repo)
            .collect()
    } else {
        repos
    };
    if repos.is_empty() {
        println!("Nothing to install: no repositories given and none tracked yet.");
        return Ok(());
    }

    let release_cache = ReleaseCache::new(dirs.release_cache_file(), config.ttl_secs, fresh);
    let artifact_cache = ArtifactCache::open(dirs.artifact_cache_dir(), config.ttl_secs, fresh)?;
    let apt = AptGet;
    let ctx = InstallContext {
        dirs,
        config,
        release_cache: &release_cache,
        artifact_cache: &artifact_cache,
        db: &db,
        lock: &lock,
        arch: HostArch::detect()?,
        sysman: Some(&apt),
    };

    let results = install_repos(&repos, &ctx);
    for (name, outcome) in &results {
        match outcome {
            Outcome::Installed { version } => {
                println!("{} {} {}", "installed".green(), name, version);
            }
            Outcome::Updated { from, to } => {
                println!("{} {} {} -> {}", "updated".cyan(), name, from, to);
            }
            Outcome::UpToDate { version } => {
                println!("{} {} {}", "up to date".dimmed(), name, version);
            }
            Outcome::SystemInstalled => {
                println!("{} {} (system package manager)", "installed".green(), name);
            }
            Outcome::Skipped { reason } => {
                println!("{} {}: {}", "skipped".yellow(), name, reason);
            }
        }
    }
    Ok(())
}

pub fn execute_list(dirs: &BinupDirs, verbose: bool) -> Result<()> {
    let db = PackageDb::open(dirs.db_file());
    let packages = db.list()?;
    if packages.is_empty() {
        println!("No packages tracked");
        return Ok(());
    }
    for (name, record) in packages {
        println!("{}: {} ({})", name.bold(), record.version, record.repo);
        println!("  installed: {}", record.installed_at.format("%Y-%m-%d %H:%M:%S UTC"));
        println!("  updated:   {}", record.updated_at.format("%Y-%m-%d %H:%M:%S UTC"));
        if verbose {
            for file in &record.files {
                println!("  file: {}", file.display());
            }
        } else {
            println!("  files: {}", record.files.len());
        }
        println!();
    }
    Ok(())
}

pub fn execute_status(dirs: &BinupDirs, name: &str) -> Result<()> {
    let db = PackageDb::open(dirs.db_file());
    // single read; the report and the linkage probe work from the same record
    let record = db.read(name)?;
    match assess(record.as_ref(), name) {
        PackageHealth::NotInstalled => {
            println!("{}: {}", name, "not installed".dimmed());
        }
        PackageHealth::Installed { version } => {
            println!("{}: {} {}", name, "installed".green(), version);
            if let Some(binary) = record.as_ref().and_then(|r| r.files.first()) {
                report_linkage(binary);
            }
        }
        PackageHealth::FilesMissing { version, missing } => {
            println!(
                "{}: {} {} but files are missing:",
                name,
                "installed".yellow(),
                version
            );
            for path in missing {
                println!("  missing: {}", path.display());
            }
        }
        PackageHealth::Unmanaged { path } => {
            println!(
                "{}: {} at {}",
                name,
                "present but not managed by binup".yellow(),
                path.display()
            );
        }
    }
    Ok(())
}

fn report_linkage(binary: &std::path::Path) {
    match LddInspector.inspect(binary) {
        Ok(Linkage::Static) => println!("  linkage: static"),
        Ok(Linkage::Satisfied) => println!("  linkage: all shared libraries found"),
        Ok(Linkage::Missing(libs)) => {
            println!("  linkage: {} shared libraries {}", libs.len(), "missing".red());
            for lib in libs {
                println!("    {}", lib);
            }
        }
        Err(e) => tracing::debug!(error = %e, "dependency inspection unavailable"),
    }
}

pub fn execute_remove(dirs: &BinupDirs, name: &str) -> Result<()> {
    let lock = DbLock::acquire(&dirs.lock_file())?;
    let db = PackageDb::open(dirs.db_file());
    if !remove_package(&db, &lock, name)? {
        bail!("package not found: {}", name);
    }
    println!("{} {}", "removed".green(), name);
    Ok(())
}

pub fn execute_clean(dirs: &BinupDirs, config: &Config) -> Result<()> {
    ReleaseCache::new(dirs.release_cache_file(), config.ttl_secs, false).clear()?;
    ArtifactCache::open(dirs.artifact_cache_dir(), config.ttl_secs, false)?.clear()?;
    println!("Caches cleared");
    Ok(())
}
