use std::path::Path;

use anyhow::{Context, Result, bail};
use flate2::read::GzDecoder;

/// Unpacks `archive` into `dest` based on its filename extension.
///
/// Understands `.tar.gz`/`.tgz` and `.zip`; anything else is a hard error
/// (selection should never have produced it).
pub fn extract_archive(archive: &Path, dest: &Path) -> Result<()> {
    std::fs::create_dir_all(dest)?;
    let name = archive
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
        let file = std::fs::File::open(archive)
            .with_context(|| format!("could not open {}", archive.display()))?;
        let mut tarball = tar::Archive::new(GzDecoder::new(file));
        tarball
            .unpack(dest)
            .with_context(|| format!("could not extract {}", archive.display()))?;
    } else if name.ends_with(".zip") {
        let file = std::fs::File::open(archive)
            .with_context(|| format!("could not open {}", archive.display()))?;
        let mut zip = zip::ZipArchive::new(file)
            .with_context(|| format!("could not read {}", archive.display()))?;
        zip.extract(dest)
            .with_context(|| format!("could not extract {}", archive.display()))?;
    } else {
        bail!("unsupported archive format: {}", name);
    }
    Ok(())
}
