use std::path::PathBuf;

use anyhow::Result;

use crate::db::{PackageDb, PackageRecord};

/// What a read-only cross-check of store, filesystem and `PATH` found.
///
/// Drift is only ever reported, never auto-healed: binup does not recreate
/// missing files or adopt binaries it did not install.
#[derive(Debug, PartialEq)]
pub enum PackageHealth {
    /// Not in the store and not on `PATH`.
    NotInstalled,
    /// In the store and every recorded file exists.
    Installed { version: String },
    /// In the store, but some recorded files are gone.
    FilesMissing {
        version: String,
        missing: Vec<PathBuf>,
    },
    /// Not in the store, but a same-named binary exists on `PATH`
    /// (installed by something else, e.g. the distro package manager).
    Unmanaged { path: PathBuf },
}

/// Checks one package against the store, the filesystem and `PATH`.
pub fn check_package(db: &PackageDb, name: &str) -> Result<PackageHealth> {
    Ok(assess(db.read(name)?.as_ref(), name))
}

/// Derives the health report from a store record already in hand, so callers
/// holding the record do not race a concurrent `remove` on a second read.
pub fn assess(record: Option<&PackageRecord>, name: &str) -> PackageHealth {
    match record {
        Some(record) => {
            let missing: Vec<PathBuf> = record
                .files
                .iter()
                .filter(|path| !path.exists())
                .cloned()
                .collect();
            if missing.is_empty() {
                PackageHealth::Installed {
                    version: record.version.clone(),
                }
            } else {
                PackageHealth::FilesMissing {
                    version: record.version.clone(),
                    missing,
                }
            }
        }
        None => match which::which(name) {
            Ok(path) => PackageHealth::Unmanaged { path },
            Err(_) => PackageHealth::NotInstalled,
        },
    }
}
