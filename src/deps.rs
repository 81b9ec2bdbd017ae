use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result};

/// How an installed binary's shared-library needs look on this host.
#[derive(Debug, Clone, PartialEq)]
pub enum Linkage {
    /// Statically linked, nothing to resolve.
    Static,
    /// Dynamically linked and every library resolves.
    Satisfied,
    /// Dynamically linked with unresolved libraries. Reported only; binup
    /// never tries to install them.
    Missing(Vec<String>),
}

/// Capability check on an extracted binary. A trait so the installer and
/// status command are testable without a dynamic linker present.
pub trait DependencyInspector {
    fn inspect(&self, binary: &Path) -> Result<Linkage>;
}

/// Shells out to `ldd`.
pub struct LddInspector;

impl DependencyInspector for LddInspector {
    fn inspect(&self, binary: &Path) -> Result<Linkage> {
        let output = Command::new("ldd")
            .arg(binary)
            .output()
            .context("could not run ldd")?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        Ok(parse_ldd_output(&stdout, &stderr))
    }
}

fn parse_ldd_output(stdout: &str, stderr: &str) -> Linkage {
    let combined = format!("{}\n{}", stdout, stderr);
    if combined.contains("not a dynamic executable")
        || combined.contains("statically linked")
    {
        return Linkage::Static;
    }
    let missing: Vec<String> = stdout
        .lines()
        .filter(|line| line.contains("not found"))
        .filter_map(|line| line.split_whitespace().next())
        .map(|lib| lib.to_string())
        .collect();
    if missing.is_empty() {
        Linkage::Satisfied
    } else {
        Linkage::Missing(missing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_binary() {
        assert_eq!(
            parse_ldd_output("", "\tnot a dynamic executable\n"),
            Linkage::Static
        );
        assert_eq!(
            parse_ldd_output("\tstatically linked\n", ""),
            Linkage::Static
        );
    }

    #[test]
    fn test_satisfied() {
        let stdout = "\tlinux-vdso.so.1 (0x00007fff)\n\tlibc.so.6 => /lib/x86_64-linux-gnu/libc.so.6 (0x00007f)\n";
        assert_eq!(parse_ldd_output(stdout, ""), Linkage::Satisfied);
    }

    #[test]
    fn test_missing_libraries() {
        let stdout = "\tlibc.so.6 => /lib/libc.so.6 (0x1)\n\tlibfoo.so.3 => not found\n\tlibbar.so.1 => not found\n";
        assert_eq!(
            parse_ldd_output(stdout, ""),
            Linkage::Missing(vec!["libfoo.so.3".to_string(), "libbar.so.1".to_string()])
        );
    }
}
