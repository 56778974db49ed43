//! Shared test utilities for the CLI end-to-end tests.
//!
//! ## Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! let fixture = TestFixture::new().with_sources(&[("std_msgs", &url)]);
//! fixture.command().arg("clone").assert().success();
//! ```

use assert_fs::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    #[allow(unused_imports)]
    pub use assert_fs::prelude::*;
    pub use predicates::prelude::*;

    #[cfg(unix)]
    #[allow(unused_imports)]
    pub use super::recording_tool;
    #[allow(unused_imports)]
    pub use super::{init_git_repo, TestFixture};
}

/// A temporary base directory holding a source list and, after a run, the
/// `genmsg` workspace.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Write `source_list.json` with the given raw content.
    pub fn with_source_list(self, content: &str) -> Self {
        self.temp_dir
            .child("source_list.json")
            .write_str(content)
            .expect("Failed to write source list");
        self
    }

    /// Write `source_list.json` from `(name, url)` pairs.
    #[allow(dead_code)]
    pub fn with_sources(self, sources: &[(&str, &str)]) -> Self {
        let entries: Vec<serde_json::Value> = sources
            .iter()
            .map(|(name, url)| serde_json::json!({ "name": name, "url": url }))
            .collect();
        let content = serde_json::Value::Array(entries).to_string();
        self.with_source_list(&content)
    }

    /// Add a file relative to the base directory.
    #[allow(dead_code)]
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn workspace(&self) -> PathBuf {
        self.temp_dir.path().join("genmsg")
    }

    /// Command running in the base directory, allowed to run as root so the
    /// suite works in containers.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = self.bare_command();
        cmd.arg("--allow-root");
        cmd
    }

    /// Command without `--allow-root`.
    pub fn bare_command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("genmsg-workspace");
        cmd.current_dir(self.path())
            .env_remove("GENMSG_ALLOW_ROOT")
            .env_remove("GENMSG_SOURCES")
            .env_remove("GENMSG_BASE_DIR")
            .env_remove("GENMSG_WORKSPACE")
            .env_remove("RUST_LOG");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a git repository at `dir` with one commit containing `files`, and
/// return a `file://` URL for it.
#[allow(dead_code)]
pub fn init_git_repo(dir: &Path, files: &[(&str, &str)]) -> String {
    for (path, content) in files {
        let full = dir.join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, content).unwrap();
    }
    fs::create_dir_all(dir).unwrap();

    let git = |args: &[&str]| {
        let status = Command::new("git")
            .arg("-C")
            .arg(dir)
            .args(["-c", "user.name=test", "-c", "user.email=test@example.com"])
            .args(args)
            .status()
            .expect("git must be installed for integration tests");
        assert!(status.success(), "git {:?} failed", args);
    };
    git(&["init", "-q"]);
    git(&["add", "."]);
    git(&["commit", "-q", "-m", "initial"]);

    format!("file://{}", dir.display())
}

/// Write an executable script that appends its arguments to `log` and exits
/// with `exit_code`.
#[cfg(unix)]
#[allow(dead_code)]
pub fn recording_tool(dir: &Path, name: &str, log: &Path, exit_code: i32) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let script = dir.join(name);
    fs::write(
        &script,
        format!(
            "#!/bin/sh\necho \"{} $@\" >> \"{}\"\nexit {}\n",
            name,
            log.display(),
            exit_code
        ),
    )
    .unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
    script
}
