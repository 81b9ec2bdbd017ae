//! # Binup Core Library
//!
//! This crate contains the core logic of the `binup` tool – an installer and
//! tracker for prebuilt binaries published as GitHub release assets, living
//! next to (not instead of) your distro package manager.
//!
//! For every tracked repository binup knows the latest upstream release
//! (without hitting the API on each run), the downloaded artifact that
//! corresponds to it, and what is installed on disk, so re-runs are idempotent
//! and concurrent invocations cannot corrupt the package database.
//!
//! This library is built for the `binup` CLI, but you can also reuse it as a
//! backend in other tools.
//!
//! ## Modules Overview
//! - [`version`] – Version comparison over messy upstream tags
//! - [`assets`] – Picking the right release asset for the host architecture
//! - [`github`] – GitHub release API client
//! - [`cache`] – Release-metadata cache (TTL) and artifact cache (one per repo)
//! - [`db`] – Durable package database with atomic writes
//! - [`lock`] – Cross-process advisory lock with stale-holder reclaim
//! - [`installer`] – The per-repository install pipeline
//! - [`verify`] – Read-only store/filesystem/PATH cross-check
//! - [`deps`] – Shared-library inspection of installed binaries
//! - [`sysman`] – System package manager fallback
//! - [`util`] – Shared utilities (atomic writes, binary discovery)

pub mod assets;
pub mod cache;
pub mod config;
pub mod db;
pub mod deps;
pub mod dirs;
pub mod download;
pub mod extract;
pub mod github;
pub mod installer;
pub mod lock;
pub mod sysman;
pub mod util;
pub mod verify;
pub mod version;

pub use cache::{ArtifactCache, ReleaseCache};
pub use db::{PackageDb, PackageRecord};
pub use github::{Release, ReleaseAsset};
pub use lock::{DbLock, LockError};
pub use verify::PackageHealth;
