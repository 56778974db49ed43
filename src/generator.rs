//! # External Collaborators
//!
//! The pipeline hands the assembled workspace to two external tools: a
//! message-code generator and a package installer. Both sit behind traits so
//! the pipeline can be driven with fakes in tests.
//!
//! The default implementations shell out to:
//!
//! - `rospy-build genmsg <package_dir> -s <workspace_root>`
//! - `<python> -m pip install -e <package_dir>`
//!
//! Both inherit stdio so the tools' own progress output reaches the user, and
//! both run with the build `PYTHONPATH` accumulated so far.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::debug;

use crate::error::{Error, Result};
use crate::pythonpath::PythonPath;

/// Generates message code for one package of the workspace.
pub trait Generator: Send + Sync {
    fn generate(
        &self,
        workspace_root: &Path,
        package_dir: &Path,
        python_path: &PythonPath,
    ) -> Result<()>;
}

/// Installs a generated package into the active environment.
pub trait Installer: Send + Sync {
    fn install(&self, package_dir: &Path, python_path: &PythonPath) -> Result<()>;
}

/// Generator backed by the `rospy-build` command line tool.
#[derive(Debug, Clone)]
pub struct RospyBuild {
    program: PathBuf,
}

impl RospyBuild {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Generator for RospyBuild {
    fn generate(
        &self,
        workspace_root: &Path,
        package_dir: &Path,
        python_path: &PythonPath,
    ) -> Result<()> {
        let mut command = Command::new(&self.program);
        command
            .arg("genmsg")
            .arg(package_dir)
            .arg("-s")
            .arg(workspace_root);
        run_tool(command, &self.program, python_path.value()?)
    }
}

/// Installer that runs `pip install -e` through a Python interpreter.
#[derive(Debug, Clone)]
pub struct PipInstaller {
    python: PathBuf,
}

impl PipInstaller {
    pub fn new(python: impl Into<PathBuf>) -> Self {
        Self {
            python: python.into(),
        }
    }
}

impl Installer for PipInstaller {
    fn install(&self, package_dir: &Path, python_path: &PythonPath) -> Result<()> {
        let mut command = Command::new(&self.python);
        command.args(["-m", "pip", "install", "-e"]).arg(package_dir);
        run_tool(command, &self.python, python_path.value()?)
    }
}

fn run_tool(mut command: Command, program: &Path, python_path: OsString) -> Result<()> {
    let tool = program.display().to_string();
    command.env("PYTHONPATH", python_path);
    debug!("Running {:?}", command);

    let status = command.status().map_err(|e| Error::ExternalTool {
        tool: tool.clone(),
        code: None,
        message: format!("failed to start: {}", e),
    })?;

    if !status.success() {
        return Err(Error::ExternalTool {
            tool,
            code: status.code(),
            message: match status.code() {
                Some(_) => "exited unsuccessfully".to_string(),
                None => "terminated by signal".to_string(),
            },
        });
    }
    Ok(())
}
