//! Arguments shared by the commands that touch a workspace.

use anyhow::{Context, Result};
use clap::Args;
use std::env;
use std::path::PathBuf;

use genmsg_workspace::config::PipelineConfig;
use genmsg_workspace::defaults;
use genmsg_workspace::generator::{PipInstaller, RospyBuild};
use genmsg_workspace::output::OutputConfig;
use genmsg_workspace::pipeline::{Pipeline, Report};
use genmsg_workspace::privilege::Unrestricted;
use genmsg_workspace::repository::FetchResult;

use crate::cli::GlobalOptions;

/// Where the source list and workspace live
#[derive(Args, Debug, Clone, Default)]
pub struct WorkspaceArgs {
    /// Path to the source list [default: <BASE_DIR>/source_list.json]
    #[arg(short, long, value_name = "PATH", env = "GENMSG_SOURCES")]
    pub sources: Option<PathBuf>,

    /// Base directory for the default source list and workspace [default: current directory]
    #[arg(long, value_name = "DIR", env = "GENMSG_BASE_DIR")]
    pub base_dir: Option<PathBuf>,

    /// Workspace root [default: <BASE_DIR>/genmsg]
    #[arg(short, long, value_name = "DIR", env = "GENMSG_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    /// Fetch sources one at a time
    #[arg(long)]
    pub sequential: bool,
}

impl WorkspaceArgs {
    /// Build the pipeline configuration, applying defaults.
    pub fn to_config(&self) -> Result<PipelineConfig> {
        let base_dir = match &self.base_dir {
            Some(dir) => dir.clone(),
            None => env::current_dir().context("Failed to get current directory")?,
        };

        let mut config = PipelineConfig::from_base_dir(&base_dir);
        if let Some(sources) = &self.sources {
            config.sources_path = sources.clone();
        }
        if let Some(workspace) = &self.workspace {
            config.workspace_root = workspace.clone();
        }

        Ok(config
            .with_parallel_fetch(!self.sequential)
            .with_inherited_python_path(env::var_os("PYTHONPATH")))
    }
}

/// External tools used to build packages
#[derive(Args, Debug, Clone)]
pub struct ToolArgs {
    /// Message generator program
    #[arg(long, value_name = "PROGRAM", default_value = defaults::GENERATOR_PROGRAM)]
    pub generator: PathBuf,

    /// Python interpreter used to run pip [default: python3, python on Windows]
    #[arg(long, value_name = "PROGRAM")]
    pub python: Option<PathBuf>,

    /// Source that is fetched but not built (repeatable)
    #[arg(
        long = "skip-package",
        value_name = "NAME",
        default_values_t = defaults::prebuilt_packages()
    )]
    pub skip_packages: Vec<String>,
}

/// Assemble a pipeline from the parsed options.
pub fn pipeline(config: PipelineConfig, tools: &ToolArgs, global: &GlobalOptions) -> Pipeline {
    let python = tools
        .python
        .clone()
        .unwrap_or_else(|| PathBuf::from(defaults::python_program()));

    let mut pipeline = Pipeline::new(config)
        .with_generator(Box::new(RospyBuild::new(&tools.generator)))
        .with_installer(Box::new(PipInstaller::new(python)));
    if global.allow_root {
        pipeline = pipeline.with_privilege_check(Box::new(Unrestricted));
    }
    pipeline
}

/// Print one line per fetched source.
pub fn print_fetched(output: &OutputConfig, fetched: &[(String, FetchResult)]) {
    for (name, result) in fetched {
        let status = match result {
            FetchResult::Cloned => "cloned",
            FetchResult::AlreadyPresent => "already present",
        };
        output.detail(&format!("{}: {}", name, status));
    }
}

/// Print the summary of a finished build.
pub fn print_report(output: &OutputConfig, report: &Report) {
    print_fetched(output, &report.fetched);
    if let Some(custom) = &report.custom_package {
        output.detail(&format!("custom package merged into {}", custom.display()));
    }
    for skipped in &report.skipped {
        output.detail(&format!("{}: no msg directory, skipped", skipped));
    }
    for package in &report.generated {
        output.detail(&format!("built {}", package.display()));
    }
    if let Some(script) = &report.activation_script {
        output.detail(&format!("PYTHONPATH saved to {}", script.display()));
    }
}
