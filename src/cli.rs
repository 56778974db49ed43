//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};
use genmsg_workspace::output::OutputConfig;

use crate::commands;

/// genmsg-workspace - Fetch message repositories and build message packages
#[derive(Parser, Debug)]
#[command(name = "genmsg-workspace")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, global = true, value_name = "LEVEL", default_value = "info")]
    log_level: String,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Allow running as root
    #[arg(long, global = true, env = "GENMSG_ALLOW_ROOT")]
    allow_root: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Clone every repository of the source list into the workspace
    Clone(commands::clone::CloneArgs),

    /// Fetch sources, then generate and install their message packages
    Build(commands::build::BuildArgs),

    /// Fetch sources, merge a custom message package and build it
    Custom(commands::custom::CustomArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

/// Options shared by every command.
#[derive(Debug, Clone)]
pub struct GlobalOptions {
    pub output: OutputConfig,
    pub allow_root: bool,
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);

        let global = GlobalOptions {
            output: OutputConfig::from_env_and_flag(&self.color).quiet(self.quiet),
            allow_root: self.allow_root,
        };

        match self.command {
            Commands::Clone(args) => commands::clone::execute(args, &global),
            Commands::Build(args) => commands::build::execute(args, &global),
            Commands::Custom(args) => commands::custom::execute(args, &global),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}

fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    // A second initialization only happens in tests; keep the first logger
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .try_init();
}
