use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use regex::Regex;
use tempfile::NamedTempFile;
use walkdir::WalkDir;

/// Writes `bytes` to `path` through a temp file in the same directory and an
/// atomic rename, so readers only ever observe the old or the new document.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .with_context(|| format!("{} has no parent directory", path.display()))?;
    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("could not create temp file in {}", dir.display()))?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)
        .with_context(|| format!("could not replace {}", path.display()))?;
    Ok(())
}

/// Extra files an archive may ship besides the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtraFile {
    ShellCompletion,
    ManPage,
}

/// Classifies a filename as a shell completion script or man page, if it is one.
pub fn classify_extra_file(name: &str) -> Option<ExtraFile> {
    if name.ends_with(".bash") || name.ends_with(".zsh") || name.ends_with(".fish") {
        return Some(ExtraFile::ShellCompletion);
    }
    let man = Regex::new(r"\.[1-9](\.gz)?$").expect("static pattern");
    if man.is_match(name) {
        return Some(ExtraFile::ManPage);
    }
    None
}

/// Locates the tool binary inside an extracted archive tree.
///
/// Walks the tree for executable regular files and prefers one whose name
/// starts with the package name (archives often ship LICENSE/README next to
/// the binary, sometimes marked executable).
pub fn find_binary(dir: &Path, name: &str) -> Result<PathBuf> {
    let mut candidates = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry?;
        if entry.file_type().is_file()
            && is_executable(entry.path())
            && classify_extra_file(&entry.file_name().to_string_lossy()).is_none()
        {
            candidates.push(entry.path().to_path_buf());
        }
    }
    if candidates.is_empty() {
        bail!("no executable found in extracted archive for '{}'", name);
    }

    let re = Regex::new(&format!(r"(?i)^{}", regex::escape(name)))?;
    candidates.sort_by_key(|p| {
        let fname = p
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .to_lowercase();
        if re.is_match(&fname) { 0 } else { 10 }
    });
    Ok(candidates.remove(0))
}

#[cfg(unix)]
pub fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|meta| meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(windows)]
pub fn is_executable(path: &Path) -> bool {
    if let Some(ext) = path.extension().and_then(|ext| ext.to_str()) {
        let ext = ext.to_ascii_lowercase();
        matches!(ext.as_str(), "exe" | "bat" | "cmd")
    } else {
        false
    }
}

/// Marks `path` executable for the owning user.
#[cfg(unix)]
pub fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = std::fs::metadata(path)?.permissions();
    perms.set_mode(perms.mode() | 0o755);
    std::fs::set_permissions(path, perms)?;
    Ok(())
}

#[cfg(not(unix))]
pub fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}
