//! # Repository Fetching
//!
//! This module provides the `RepoFetcher`, which makes sure every entry of a
//! source list has a local working copy at `workspace_root/<name>`.
//!
//! ## Design
//!
//! Fetching is idempotent on path existence: a target directory that already
//! exists is never touched, so repeated runs are cheap and an outdated clone
//! is only refreshed by deleting it. Git access goes through the
//! **`GitOperations`** trait so tests can substitute a mock that records clone
//! calls instead of running `git`.
//!
//! A clone is first made in a staging directory inside the workspace root and
//! then renamed into place. A failed or interrupted clone therefore never
//! leaves a partial `workspace_root/<name>` behind, and two fetchers racing
//! for the same name settle on whichever rename lands first.

use std::fs;
use std::path::Path;

use log::info;
use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::sources::{SourceEntry, SourceList};

/// Trait for git operations - allows mocking in tests
pub trait GitOperations: Send + Sync {
    /// Clones `url` into `target_dir`, at `ref_name` when given.
    ///
    /// `target_dir` does not exist when this is called.
    fn clone_shallow(&self, url: &str, ref_name: Option<&str>, target_dir: &Path) -> Result<()>;
}

/// The default implementation of `GitOperations`, which uses the system's
/// `git` command.
pub struct DefaultGitOperations;

impl GitOperations for DefaultGitOperations {
    fn clone_shallow(&self, url: &str, ref_name: Option<&str>, target_dir: &Path) -> Result<()> {
        crate::git::clone_shallow(url, ref_name, target_dir)
    }
}

/// Outcome of fetching a single source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchResult {
    /// The target directory did not exist and was cloned.
    Cloned,
    /// The target directory already existed and was left untouched.
    AlreadyPresent,
}

/// Fetches source entries into a workspace.
pub struct RepoFetcher {
    git_ops: Box<dyn GitOperations>,
}

impl Default for RepoFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl RepoFetcher {
    /// Creates a fetcher backed by the system `git`.
    pub fn new() -> Self {
        Self {
            git_ops: Box::new(DefaultGitOperations),
        }
    }

    /// Creates a fetcher with a custom `GitOperations` implementation.
    pub fn with_operations(git_ops: Box<dyn GitOperations>) -> Self {
        Self { git_ops }
    }

    /// Ensures `workspace_root/<entry.name>` exists, cloning it if absent.
    pub fn fetch(&self, entry: &SourceEntry, workspace_root: &Path) -> Result<FetchResult> {
        let target = workspace_root.join(&entry.name);
        if target.exists() {
            info!("{} already exists locally at {}", entry.url, target.display());
            return Ok(FetchResult::AlreadyPresent);
        }

        fs::create_dir_all(workspace_root)?;
        let staging = tempfile::Builder::new()
            .prefix(".fetch-")
            .tempdir_in(workspace_root)?;
        let staged = staging.path().join(&entry.name);

        info!("Cloning {} into {}", entry.url, target.display());
        self.git_ops
            .clone_shallow(&entry.url, entry.r#ref.as_deref(), &staged)?;

        match fs::rename(&staged, &target) {
            Ok(()) => Ok(FetchResult::Cloned),
            // Lost a race against another fetcher for the same name
            Err(_) if target.exists() => Ok(FetchResult::AlreadyPresent),
            Err(e) => Err(Error::Fetch {
                url: entry.url.clone(),
                r#ref: entry.r#ref.clone(),
                message: format!("failed to move clone to {}: {}", target.display(), e),
                hint: None,
            }),
        }
    }

    /// Fetches every entry of `sources`.
    ///
    /// Entries are independent, so with `parallel` they are fetched
    /// concurrently. Either way all fetches finish before this returns, and
    /// the first failure in source-list order is reported. Results are in
    /// source-list order.
    pub fn fetch_all(
        &self,
        sources: &SourceList,
        workspace_root: &Path,
        parallel: bool,
    ) -> Result<Vec<FetchResult>> {
        fs::create_dir_all(workspace_root)?;

        let results: Vec<Result<FetchResult>> = if parallel {
            sources
                .entries()
                .par_iter()
                .map(|entry| self.fetch(entry, workspace_root))
                .collect()
        } else {
            sources
                .iter()
                .map(|entry| self.fetch(entry, workspace_root))
                .collect()
        };

        results.into_iter().collect()
    }
}
