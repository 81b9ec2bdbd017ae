//! Two-tier cache: release metadata (JSON document, TTL-gated) and downloaded
//! artifacts (one retained archive per repository, swept by age).
//!
//! Neither tier is protected by the package database lock. Concurrent
//! invocations may race here with last-writer-wins semantics; every entry is
//! re-derivable from the network, so a lost write only costs a re-fetch.

pub mod artifact;
pub mod release;

pub use artifact::ArtifactCache;
pub use release::{ReleaseCache, ReleaseCacheEntry};
