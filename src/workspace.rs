//! # Workspace Assembly
//!
//! Helpers that shape the generation workspace on the host filesystem:
//!
//! - [`merge`] places a user-authored custom package into the workspace,
//!   replacing whatever an earlier run left under the same name.
//! - [`remove_if_exists`] is the best-effort removal used for that
//!   replacement; a missing target counts as success.
//! - [`find_package_dir`] locates the message package inside a checkout,
//!   i.e. the first directory that holds a `msg/` directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info};
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Copy `custom_dir` to `workspace_root/<base name of custom_dir>`.
///
/// Any previous content at the target is removed first, so afterwards the
/// target holds exactly the current content of `custom_dir`. Returns the
/// target path.
pub fn merge(custom_dir: &Path, workspace_root: &Path) -> Result<PathBuf> {
    let copy_error = |dst: &Path, message: String| Error::Copy {
        src: custom_dir.to_path_buf(),
        dst: dst.to_path_buf(),
        message,
    };

    if !custom_dir.is_dir() {
        return Err(copy_error(
            workspace_root,
            "custom package directory does not exist or is not a directory".to_string(),
        ));
    }

    let derived_name = derived_name(custom_dir).map_err(|e| copy_error(workspace_root, e))?;
    let target = workspace_root.join(&derived_name);

    // Replacing the target must not delete the source, and the copy must not
    // land inside the tree being walked
    let src = custom_dir
        .canonicalize()
        .map_err(|e| copy_error(workspace_root, e.to_string()))?;
    let root = canonicalize_lenient(workspace_root)
        .map_err(|e| copy_error(workspace_root, e.to_string()))?;
    if src.starts_with(root.join(&derived_name)) {
        return Err(copy_error(
            &target,
            "custom package directory lies inside its own workspace target".to_string(),
        ));
    }
    if root.starts_with(&src) {
        return Err(copy_error(
            workspace_root,
            "workspace root lies inside the custom package directory".to_string(),
        ));
    }

    remove_if_exists(&target).map_err(|e| copy_error(&target, e.to_string()))?;
    fs::create_dir_all(workspace_root).map_err(|e| copy_error(workspace_root, e.to_string()))?;

    info!(
        "Merging custom package {} into {}",
        custom_dir.display(),
        target.display()
    );
    copy_dir_all(custom_dir, &target)?;
    Ok(target)
}

/// Base name of a directory, resolving `.`-style paths through the
/// filesystem.
fn derived_name(dir: &Path) -> std::result::Result<String, String> {
    let name = match dir.file_name() {
        Some(name) => name.to_os_string(),
        None => dir
            .canonicalize()
            .map_err(|e| e.to_string())?
            .file_name()
            .map(|n| n.to_os_string())
            .ok_or_else(|| "cannot derive a package name from this path".to_string())?,
    };
    name.into_string()
        .map_err(|n| format!("package name {:?} is not valid UTF-8", n))
}

/// Canonicalize the longest existing prefix of `path` and append the rest, so
/// paths that are not created yet can still be compared.
fn canonicalize_lenient(path: &Path) -> io::Result<PathBuf> {
    let mut existing = path;
    let mut missing = Vec::new();
    loop {
        match existing.canonicalize() {
            Ok(resolved) => {
                return Ok(missing.iter().rev().fold(resolved, |acc, part| acc.join(part)));
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                match (existing.parent(), existing.file_name()) {
                    (Some(parent), Some(name)) => {
                        missing.push(name.to_os_string());
                        existing = if parent.as_os_str().is_empty() {
                            Path::new(".")
                        } else {
                            parent
                        };
                    }
                    _ => return Err(e),
                }
            }
            Err(e) => return Err(e),
        }
    }
}

/// Remove a file or directory tree. A target that does not exist is not an
/// error.
pub fn remove_if_exists(path: &Path) -> io::Result<()> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };

    let result = if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };

    match result {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// Recursively copy `src` into `dst`, preserving structure.
fn copy_dir_all(src: &Path, dst: &Path) -> Result<()> {
    for entry in WalkDir::new(src).follow_links(true) {
        let entry = entry.map_err(|e| Error::Copy {
            src: e.path().unwrap_or(src).to_path_buf(),
            dst: dst.to_path_buf(),
            message: e.to_string(),
        })?;

        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| Error::Copy {
                src: entry.path().to_path_buf(),
                dst: dst.to_path_buf(),
                message: e.to_string(),
            })?;
        let out = dst.join(relative);

        let result = if entry.file_type().is_dir() {
            fs::create_dir_all(&out)
        } else {
            debug!("Copying {}", relative.display());
            fs::copy(entry.path(), &out).map(|_| ())
        };

        result.map_err(|e| Error::Copy {
            src: entry.path().to_path_buf(),
            dst: out.clone(),
            message: e.to_string(),
        })?;
    }
    Ok(())
}

/// Find the first directory under `root` (including `root`) that contains a
/// `msg` directory. Traversal is depth-first in file-name order and skips
/// `.git`.
pub fn find_package_dir(root: &Path) -> Option<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.file_name() != ".git")
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir())
        .find(|e| e.path().join("msg").is_dir())
        .map(|e| e.into_path())
}
