//! Guard against running the pipeline with elevated privileges.
//!
//! Running as root would leave root-owned clones and build artifacts in a
//! workspace and Python environment that belong to a regular user.

use crate::error::{Error, Result};

/// Reports whether the current process is elevated. A trait so tests can
/// simulate a root user.
pub trait PrivilegeCheck: Send + Sync {
    fn is_elevated(&self) -> bool;
}

/// Checks the effective user of the running process.
pub struct ProcessPrivilege;

impl PrivilegeCheck for ProcessPrivilege {
    #[cfg(unix)]
    fn is_elevated(&self) -> bool {
        effective_uid() == Some(0)
    }

    #[cfg(not(unix))]
    fn is_elevated(&self) -> bool {
        false
    }
}

/// Never elevated. Backs the `--allow-root` escape hatch.
pub struct Unrestricted;

impl PrivilegeCheck for Unrestricted {
    fn is_elevated(&self) -> bool {
        false
    }
}

/// Effective uid: the `Uid:` line of `/proc/self/status` where procfs
/// exists, `id -u` otherwise.
///
/// The owner of `/proc/self` is not used: it reads as root for
/// non-dumpable processes whatever their real user.
#[cfg(unix)]
fn effective_uid() -> Option<u32> {
    use std::process::Command;

    if let Some(uid) = std::fs::read_to_string("/proc/self/status")
        .ok()
        .and_then(|status| status_euid(&status))
    {
        return Some(uid);
    }
    let output = Command::new("id").arg("-u").output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8_lossy(&output.stdout).trim().parse().ok()
}

/// Effective uid from `/proc/<pid>/status` content. The `Uid:` line lists
/// the real, effective, saved and filesystem uids.
#[cfg(unix)]
fn status_euid(status: &str) -> Option<u32> {
    status
        .lines()
        .find_map(|line| line.strip_prefix("Uid:"))
        .and_then(|ids| ids.split_whitespace().nth(1))
        .and_then(|euid| euid.parse().ok())
}

/// Fail with [`Error::Privilege`] when `check` reports an elevated process.
pub fn ensure_unprivileged(check: &dyn PrivilegeCheck) -> Result<()> {
    if check.is_elevated() {
        return Err(Error::Privilege {
            message: "refusing to run as root; files written to the workspace and the \
                      Python environment would be owned by root (pass --allow-root to override)"
                .to_string(),
        });
    }
    Ok(())
}
