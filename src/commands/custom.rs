//! Custom command implementation
//!
//! Fetches the sources, merges a user-authored message package into the
//! workspace and builds only that package.

use anyhow::{bail, Result};
use clap::Args;
use std::path::PathBuf;
use std::time::Instant;

use super::common::{self, ToolArgs, WorkspaceArgs};
use crate::cli::GlobalOptions;

/// Arguments for the custom command
#[derive(Args, Debug)]
pub struct CustomArgs {
    /// Directory holding the custom message package (required)
    #[arg(short, long, value_name = "DIR")]
    pub interfaces_dir: Option<PathBuf>,

    #[command(flatten)]
    pub workspace: WorkspaceArgs,

    #[command(flatten)]
    pub tools: ToolArgs,
}

/// Execute the custom command
pub fn execute(args: CustomArgs, global: &GlobalOptions) -> Result<()> {
    // Checked here instead of by clap so a missing directory exits with 1
    let Some(interfaces_dir) = args.interfaces_dir else {
        bail!("Missing --interfaces-dir: pass the directory of your custom message package");
    };

    let start_time = Instant::now();
    let config = args
        .workspace
        .to_config()?
        .with_prebuilt(args.tools.skip_packages.clone())
        .with_custom_dir(&interfaces_dir);

    global.output.step(&format!(
        "Building custom package {} in {}",
        interfaces_dir.display(),
        config.workspace_root.display()
    ));
    let report = common::pipeline(config, &args.tools, global).run()?;

    global.output.success(&format!(
        "Built custom package in {:.2}s",
        start_time.elapsed().as_secs_f64()
    ));
    common::print_report(&global.output, &report);
    Ok(())
}
