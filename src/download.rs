use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use reqwest::blocking::Client;

/// Downloads `url` into `dest`, overwriting it.
///
/// No retry or backoff: a failed download fails the repository being
/// processed and the batch moves on.
pub fn download_to(url: &str, dest: &Path) -> Result<()> {
    tracing::debug!(url, dest = %dest.display(), "downloading asset");
    let client = Client::new();
    let mut response = client
        .get(url)
        .header("User-Agent", "binup")
        .send()
        .with_context(|| format!("request to {} failed", url))?
        .error_for_status()
        .with_context(|| format!("download of {} failed", url))?;

    let mut file = std::fs::File::create(dest)
        .with_context(|| format!("could not create {}", dest.display()))?;
    response
        .copy_to(&mut file)
        .with_context(|| format!("could not write {}", dest.display()))?;
    file.flush()?;
    Ok(())
}
