//! Default values for genmsg-workspace configuration.
//!
//! This module provides centralized default values used across commands,
//! ensuring consistency and avoiding duplication.

use std::path::{Path, PathBuf};

/// File name of the source list looked up in the base directory.
pub const SOURCE_LIST_FILE: &str = "source_list.json";

/// Name of the workspace directory created under the base directory.
pub const WORKSPACE_DIR: &str = "genmsg";

/// Program invoked to generate message code.
pub const GENERATOR_PROGRAM: &str = "rospy-build";

/// Packages the generator toolchain already ships; they are fetched so other
/// packages can depend on them, but never generated or installed.
pub fn prebuilt_packages() -> Vec<String> {
    vec!["std_msgs".to_string(), "common_msgs".to_string()]
}

/// Python interpreter used to run `pip`.
pub fn python_program() -> &'static str {
    if cfg!(windows) {
        "python"
    } else {
        "python3"
    }
}

/// Default source list path for a base directory.
pub fn source_list_path(base_dir: &Path) -> PathBuf {
    base_dir.join(SOURCE_LIST_FILE)
}

/// Default workspace root for a base directory.
pub fn workspace_root(base_dir: &Path) -> PathBuf {
    base_dir.join(WORKSPACE_DIR)
}
