//! `completions` subcommand: print a tab-completion script for
//! `genmsg-workspace`.
//!
//! ```bash
//! genmsg-workspace completions bash > ~/.local/share/bash-completion/completions/genmsg-workspace
//! ```

use anyhow::Result;
use clap::{Args, CommandFactory};
use clap_complete::{generate, Shell};
use std::io::{self, Write};

use crate::cli::Cli;

/// Generate shell completion scripts
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell (bash, zsh, fish, powershell, elvish)
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Write the completion script for the requested shell to stdout.
pub fn execute(args: CompletionsArgs) -> Result<()> {
    write_completions(args.shell, &mut io::stdout());
    Ok(())
}

fn write_completions(shell: Shell, out: &mut dyn Write) {
    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, out);
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_bash_completions_mention_subcommands() {
        let mut buffer = Vec::new();
        write_completions(Shell::Bash, &mut buffer);
        let script = String::from_utf8(buffer).unwrap();
        assert!(script.contains("genmsg-workspace"));
        assert!(script.contains("custom"));
        assert!(script.contains("--interfaces-dir"));
    }

    #[test]
    fn test_every_shell_is_accepted_and_generates() {
        for name in ["bash", "zsh", "fish", "powershell", "elvish"] {
            assert!(
                Cli::try_parse_from(["genmsg-workspace", "completions", name]).is_ok(),
                "{} rejected",
                name
            );
        }
        for shell in [Shell::Zsh, Shell::Fish, Shell::PowerShell, Shell::Elvish] {
            let mut buffer = Vec::new();
            write_completions(shell, &mut buffer);
            assert!(!buffer.is_empty(), "{} produced no script", shell);
        }
    }
}
