//! Clone command implementation
//!
//! Resolves the source list and clones every repository that is not yet in
//! the workspace. Nothing is generated or installed.

use anyhow::Result;
use clap::Args;

use genmsg_workspace::pipeline::Pipeline;
use genmsg_workspace::privilege::Unrestricted;

use super::common::{print_fetched, WorkspaceArgs};
use crate::cli::GlobalOptions;

/// Arguments for the clone command
#[derive(Args, Debug)]
pub struct CloneArgs {
    #[command(flatten)]
    pub workspace: WorkspaceArgs,
}

/// Execute the clone command
pub fn execute(args: CloneArgs, global: &GlobalOptions) -> Result<()> {
    let config = args.workspace.to_config()?;
    let workspace_root = config.workspace_root.clone();

    let mut pipeline = Pipeline::new(config);
    if global.allow_root {
        pipeline = pipeline.with_privilege_check(Box::new(Unrestricted));
    }

    global.output.step(&format!(
        "Fetching sources into {}",
        workspace_root.display()
    ));
    let fetched = pipeline.fetch()?;

    global
        .output
        .success(&format!("{} sources ready", fetched.len()));
    print_fetched(&global.output, &fetched);
    Ok(())
}
