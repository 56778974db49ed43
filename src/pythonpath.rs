//! Build-time `PYTHONPATH` bookkeeping.
//!
//! Every package generated during a run is prepended to the search path the
//! external tools see, so later packages can import messages from earlier
//! ones. After the run the accumulated value is saved as a small activation
//! script in the workspace root for use by later builds.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Base name of the activation script; the extension depends on the platform.
pub const ACTIVATION_SCRIPT: &str = "set_build_python_path";

#[derive(Debug, Clone, Default)]
pub struct PythonPath {
    /// Prepended entries, oldest first.
    prepended: Vec<PathBuf>,
    inherited: Vec<PathBuf>,
}

impl PythonPath {
    /// Start from an existing `PYTHONPATH` value.
    pub fn new(inherited: Option<OsString>) -> Self {
        let inherited = inherited
            .map(|value| {
                env::split_paths(&value)
                    .filter(|p| !p.as_os_str().is_empty())
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        Self {
            prepended: Vec::new(),
            inherited,
        }
    }

    /// Start from the `PYTHONPATH` of the current process.
    pub fn from_env() -> Self {
        Self::new(env::var_os("PYTHONPATH"))
    }

    pub fn prepend(&mut self, path: &Path) {
        self.prepended.push(path.to_path_buf());
    }

    /// Entries in search order: most recently prepended first.
    pub fn entries(&self) -> Vec<&Path> {
        self.prepended
            .iter()
            .rev()
            .chain(self.inherited.iter())
            .map(PathBuf::as_path)
            .collect()
    }

    /// The joined value to export as `PYTHONPATH`.
    pub fn value(&self) -> Result<OsString> {
        env::join_paths(self.entries()).map_err(|e| Error::Validation {
            message: format!("cannot build PYTHONPATH: {}", e),
        })
    }

    /// Write the activation script into `dir` and return its path.
    pub fn write_activation_script(&self, dir: &Path) -> Result<PathBuf> {
        let value = self.value()?;
        let value = value.to_string_lossy();

        let (path, content) = if cfg!(windows) {
            (
                dir.join(format!("{}.bat", ACTIVATION_SCRIPT)),
                format!("SET PYTHONPATH={}\r\n", value),
            )
        } else {
            (
                dir.join(format!("{}.sh", ACTIVATION_SCRIPT)),
                format!("export PYTHONPATH=\"{}\"\n", value),
            )
        };

        fs::create_dir_all(dir)?;
        fs::write(&path, content)?;
        Ok(path)
    }
}
