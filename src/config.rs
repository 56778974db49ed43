//! Explicit pipeline configuration.
//!
//! Everything a run depends on is carried in [`PipelineConfig`] and handed to
//! the pipeline when it is constructed; nothing is read from ambient process
//! state once the run has started.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::defaults;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Source list to resolve.
    pub sources_path: PathBuf,
    /// Directory fetched sources and the custom package are placed under.
    pub workspace_root: PathBuf,
    /// Custom package to merge and build instead of the sources.
    pub custom_dir: Option<PathBuf>,
    /// Source names that are fetched but never generated or installed.
    pub prebuilt: Vec<String>,
    /// Fetch sources concurrently.
    pub parallel_fetch: bool,
    /// `PYTHONPATH` the build starts from.
    pub inherited_python_path: Option<OsString>,
}

impl PipelineConfig {
    pub fn new(sources_path: impl Into<PathBuf>, workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            sources_path: sources_path.into(),
            workspace_root: workspace_root.into(),
            custom_dir: None,
            prebuilt: Vec::new(),
            parallel_fetch: true,
            inherited_python_path: None,
        }
    }

    /// Configuration with the default file layout under `base_dir`.
    pub fn from_base_dir(base_dir: &Path) -> Self {
        Self::new(
            defaults::source_list_path(base_dir),
            defaults::workspace_root(base_dir),
        )
    }

    pub fn with_custom_dir(mut self, custom_dir: impl Into<PathBuf>) -> Self {
        self.custom_dir = Some(custom_dir.into());
        self
    }

    pub fn with_prebuilt<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prebuilt = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_parallel_fetch(mut self, parallel: bool) -> Self {
        self.parallel_fetch = parallel;
        self
    }

    pub fn with_inherited_python_path(mut self, value: Option<OsString>) -> Self {
        self.inherited_python_path = value;
        self
    }

    pub fn is_prebuilt(&self, name: &str) -> bool {
        self.prebuilt.iter().any(|p| p == name)
    }
}
