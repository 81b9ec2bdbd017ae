use std::process::Command;

use anyhow::{Context, Result, bail};

/// Install-by-name fallback when a release ships no suitable binary.
/// Behind a trait so the installer is testable without a real package manager.
pub trait SystemPackageManager {
    fn label(&self) -> &'static str;
    fn install(&self, package: &str) -> Result<()>;
}

/// `apt-get install -y <name>`.
pub struct AptGet;

impl SystemPackageManager for AptGet {
    fn label(&self) -> &'static str {
        "apt-get"
    }

    fn install(&self, package: &str) -> Result<()> {
        tracing::info!(package, "falling back to apt-get");
        let status = Command::new("apt-get")
            .args(["install", "-y", package])
            .status()
            .context("could not run apt-get")?;
        if !status.success() {
            bail!("apt-get install {} failed with {}", package, status);
        }
        Ok(())
    }
}
