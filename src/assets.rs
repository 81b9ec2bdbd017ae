use anyhow::{Result, bail};
use regex::Regex;

use crate::github::ReleaseAsset;

/// Architecture families binup can install binaries for.
///
/// Anything else (riscv64, s390x, ...) is a hard failure at detection time,
/// never a silent fallback to an arbitrary asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostArch {
    X86_64,
    Aarch64,
}

impl HostArch {
    /// Detects the architecture of the running host.
    pub fn detect() -> Result<HostArch> {
        match std::env::consts::ARCH {
            "x86_64" => Ok(HostArch::X86_64),
            "aarch64" => Ok(HostArch::Aarch64),
            other => bail!("unsupported host architecture: {}", other),
        }
    }

    /// Architecture match patterns, most specific first.
    ///
    /// An explicit linux+arch combination always beats the bare `linux`
    /// catch-all, so a release that ships both `tool-linux-amd64.tar.gz` and
    /// `tool-linux.tar.gz` resolves to the arch-specific one.
    fn patterns(self) -> &'static [&'static str] {
        match self {
            HostArch::X86_64 => &[
                r"linux.*(x86_64|amd64)",
                r"(x86_64|amd64).*linux",
                r"linux64",
                r"linux",
            ],
            HostArch::Aarch64 => &[
                r"linux.*(aarch64|arm64)",
                r"(aarch64|arm64).*linux",
                r"linux",
            ],
        }
    }

    /// Keywords that disqualify an asset for this architecture.
    ///
    /// Includes the disjoint architecture family's own keywords, so the bare
    /// `linux` catch-all can never pick up the other family's artifact.
    fn excluded_keywords(self) -> &'static [&'static str] {
        match self {
            HostArch::X86_64 => &[
                "aarch64", "arm64", "armv7", "armv6", "arm", "i686", "i386", "386", "musl",
                "alpine", "darwin", "macos", "mac", "windows", "win64", "freebsd", "netbsd",
                "openbsd", "android",
            ],
            HostArch::Aarch64 => &[
                "x86_64", "amd64", "x64", "i686", "i386", "386", "armv7", "armv6", "musl",
                "alpine", "darwin", "macos", "mac", "windows", "win64", "freebsd", "netbsd",
                "openbsd", "android",
            ],
        }
    }
}

/// Extensions the extractor understands; everything else is not installable.
const ARCHIVE_EXTENSIONS: &[&str] = &[".tar.gz", ".tgz", ".zip"];

/// Checksums, signatures and distro packages never count as a binary archive.
const EXCLUDED_SUFFIXES: &[&str] = &[
    ".sha256", ".sha512", ".sha1", ".md5", ".sig", ".asc", ".pem", ".sbom", ".txt", ".deb",
    ".rpm", ".apk", ".msi",
];

const EXCLUDED_KEYWORDS: &[&str] = &["checksum", "sha256sum", "sbom"];

/// Picks the release asset to download for the host architecture.
///
/// Patterns are tried most specific first; the first pattern with at least one
/// candidate wins, and within that pattern the first asset in the upstream
/// list's original order is taken. Upstream order reflects upload order and is
/// treated as a meaningful tie-break. `None` means the release ships no
/// suitable binary for this host; there is no fallback to source archives.
pub fn select_asset(assets: &[ReleaseAsset], arch: HostArch) -> Option<&ReleaseAsset> {
    for pattern in arch.patterns() {
        let re = Regex::new(pattern).expect("asset patterns are static and valid");
        let found = assets
            .iter()
            .find(|asset| is_candidate(&asset.name.to_lowercase(), &re, arch));
        if found.is_some() {
            return found;
        }
    }
    None
}

fn is_candidate(name: &str, pattern: &Regex, arch: HostArch) -> bool {
    if !pattern.is_match(name) {
        return false;
    }
    if !ARCHIVE_EXTENSIONS.iter().any(|ext| name.ends_with(ext)) {
        return false;
    }
    if EXCLUDED_SUFFIXES.iter().any(|ext| name.ends_with(ext)) {
        return false;
    }
    if EXCLUDED_KEYWORDS.iter().any(|kw| name.contains(kw)) {
        return false;
    }
    !arch
        .excluded_keywords()
        .iter()
        .any(|kw| has_keyword(name, kw))
}

/// True if `keyword` occurs in `name` as a whole token.
///
/// Tokens are delimited by `-`, `_`, `.` or the string ends, so `arm` in
/// `charm-linux` or `mac` in `emacs-linux` does not disqualify the asset.
fn has_keyword(name: &str, keyword: &str) -> bool {
    let boundary = |c: Option<char>| matches!(c, None | Some('-' | '_' | '.'));
    name.match_indices(keyword).any(|(start, _)| {
        boundary(name[..start].chars().next_back())
            && boundary(name[start + keyword.len()..].chars().next())
    })
}
