use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

/// A release as returned by the GitHub API, reduced to what binup consumes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Release {
    /// The release tag, e.g. `v0.57.0`.
    pub tag_name: String,
    /// Downloadable files attached to the release, in upload order.
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

/// One downloadable file attached to a release.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReleaseAsset {
    pub name: String,
    pub browser_download_url: String,
}

/// Why a release could not be fetched.
///
/// The installer skips the repository and continues the batch on any of these;
/// the variants exist so the skip message can say which it was.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("GitHub API rate limit exceeded (set a token in config.toml or GITHUB_TOKEN)")]
    RateLimited,
    #[error("repository or release not found")]
    NotFound,
    #[error("malformed API response: {0}")]
    Malformed(String),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Fetches the latest release of `repo` (`owner/name`) from the GitHub API.
///
/// Unauthenticated calls share a very low per-IP rate limit, which is why the
/// release cache exists; pass a token whenever one is configured.
pub fn fetch_latest_release(repo: &str, token: Option<&str>) -> Result<Release, FetchError> {
    let url = format!("https://api.github.com/repos/{}/releases/latest", repo);
    let client = Client::new();
    let mut request = client
        .get(&url)
        .header("User-Agent", "binup")
        .header("Accept", "application/vnd.github+json");
    if let Some(token) = token {
        request = request.header("Authorization", format!("Bearer {}", token));
    }
    let response = request.send()?;

    match response.status() {
        StatusCode::NOT_FOUND => return Err(FetchError::NotFound),
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
            return Err(FetchError::RateLimited);
        }
        status if !status.is_success() => {
            return Err(FetchError::Malformed(format!("HTTP {}", status)));
        }
        _ => {}
    }

    let body = response.text()?;
    serde_json::from_str(&body).map_err(|e| FetchError::Malformed(e.to_string()))
}

/// The short name of a repository, used as the package name.
/// `junegunn/fzf` -> `fzf`.
pub fn package_name(repo: &str) -> &str {
    repo.rsplit('/').next().unwrap_or(repo)
}
