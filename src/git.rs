use std::fs;
use std::path::Path;
use std::process::Command;

use log::debug;

use crate::error::Error;

/// Clone a repository, optionally at a specific branch or tag, using a
/// shallow clone
///
/// This uses the system git command, which automatically handles:
/// - SSH keys from ~/.ssh/
/// - Git credential helpers
/// - Personal access tokens
/// - Any authentication configured in ~/.gitconfig
///
/// `target_dir` must not exist; its parent is created if needed.
pub fn clone_shallow(url: &str, ref_name: Option<&str>, target_dir: &Path) -> Result<(), Error> {
    if let Some(parent) = target_dir.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut command = clone_command(url, ref_name, target_dir);
    debug!("Running {:?}", command);

    let output = command.output().map_err(|e| Error::Fetch {
        url: url.to_string(),
        r#ref: ref_name.map(str::to_string),
        message: format!("failed to run git: {}", e),
        hint: Some("Make sure git is installed and on PATH".to_string()),
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(Error::Fetch {
            url: url.to_string(),
            r#ref: ref_name.map(str::to_string),
            hint: clone_failure_hint(&stderr),
            message: stderr,
        });
    }

    Ok(())
}

/// `git clone` invocation; `--` keeps a url starting with `-` from being
/// read as an option.
fn clone_command(url: &str, ref_name: Option<&str>, target_dir: &Path) -> Command {
    let mut command = Command::new("git");
    command.args(["clone", "--depth=1"]);
    if let Some(ref_name) = ref_name {
        command.args(["--branch", ref_name]);
    }
    command.arg("--").arg(url).arg(target_dir);
    command
}

/// Suggest a fix for common clone failures, based on git's stderr.
fn clone_failure_hint(stderr: &str) -> Option<String> {
    if stderr.contains("Authentication failed")
        || stderr.contains("Permission denied")
        || stderr.contains("Could not read from remote repository")
    {
        Some(
            "Make sure you have access to the repository: add your SSH key to \
             ssh-agent or configure git credentials"
                .to_string(),
        )
    } else if stderr.contains("Remote branch") && stderr.contains("not found") {
        Some("Check the 'ref' of this source; the branch or tag does not exist".to_string())
    } else if stderr.contains("Could not resolve host") {
        Some("Check your network connection and the repository URL".to_string())
    } else {
        None
    }
}
