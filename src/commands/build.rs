//! Build command implementation
//!
//! Runs the standard pipeline: fetch every source, then generate and install
//! the message package of each source that is not prebuilt.

use anyhow::Result;
use clap::Args;
use std::time::Instant;

use super::common::{self, ToolArgs, WorkspaceArgs};
use crate::cli::GlobalOptions;

/// Arguments for the build command
#[derive(Args, Debug)]
pub struct BuildArgs {
    #[command(flatten)]
    pub workspace: WorkspaceArgs,

    #[command(flatten)]
    pub tools: ToolArgs,
}

/// Execute the build command
pub fn execute(args: BuildArgs, global: &GlobalOptions) -> Result<()> {
    let start_time = Instant::now();
    let config = args
        .workspace
        .to_config()?
        .with_prebuilt(args.tools.skip_packages.clone());

    global.output.step(&format!(
        "Building message packages in {}",
        config.workspace_root.display()
    ));
    let report = common::pipeline(config, &args.tools, global).run()?;

    global.output.success(&format!(
        "Built {} packages in {:.2}s",
        report.generated.len(),
        start_time.elapsed().as_secs_f64()
    ));
    common::print_report(&global.output, &report);
    Ok(())
}
