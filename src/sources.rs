//! # Source List Resolution
//!
//! Parses the declarative list of external message repositories into
//! validated [`SourceEntry`] descriptors. Resolution has no side effects
//! beyond reading the file.
//!
//! Two document shapes are accepted:
//!
//! ```json
//! [
//!   { "name": "std_msgs", "url": "https://github.com/ros/std_msgs.git", "ref": "kinetic-devel" }
//! ]
//! ```
//!
//! and the rosinstall-style layout older workspaces still carry:
//!
//! ```json
//! { "repos": [ { "local-name": "std_msgs", "uri": "https://...", "version": "kinetic-devel" } ] }
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path};

use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};

/// One external repository to fetch into the workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    /// Workspace child directory name; unique within a list.
    pub name: String,
    /// Anything `git clone` accepts.
    pub url: String,
    /// Branch or tag to check out. `None` uses the remote's default branch.
    pub r#ref: Option<String>,
}

impl SourceEntry {
    pub fn new(name: &str, url: &str, r#ref: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            r#ref: r#ref.map(str::to_string),
        }
    }
}

/// Ordered, validated sequence of source entries, immutable for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceList {
    entries: Vec<SourceEntry>,
}

impl SourceList {
    /// Build a list from entries, applying the same validation as [`resolve`].
    pub fn new(entries: Vec<SourceEntry>) -> Result<Self> {
        let mut seen = HashSet::new();
        for (index, entry) in entries.iter().enumerate() {
            validate_name(index, &entry.name)?;
            if entry.url.trim().is_empty() {
                return Err(invalid(index, Some(&entry.name), "'url' must not be empty"));
            }
            if !seen.insert(entry.name.as_str()) {
                return Err(invalid(index, Some(&entry.name), "duplicate name"));
            }
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[SourceEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SourceEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a SourceList {
    type Item = &'a SourceEntry;
    type IntoIter = std::slice::Iter<'a, SourceEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Entry as written in the file, before validation.
#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(alias = "local-name")]
    name: Option<String>,
    #[serde(alias = "uri")]
    url: Option<String>,
    #[serde(rename = "ref", alias = "version")]
    r#ref: Option<String>,
}

/// Read and validate the source list at `path`.
pub fn resolve(path: &Path) -> Result<SourceList> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::SourceListNotFound {
                path: path.to_path_buf(),
            })
        }
        Err(e) => return Err(e.into()),
    };
    let content = String::from_utf8(bytes).map_err(|e| Error::SourceListParse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    parse(&content, path)
}

/// Parse source list content. `origin` is only used in error messages.
pub fn parse(content: &str, origin: &Path) -> Result<SourceList> {
    let document: Value = serde_json::from_str(content).map_err(|e| Error::SourceListParse {
        path: origin.to_path_buf(),
        message: e.to_string(),
    })?;

    let items = match document {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("repos") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(Error::SourceListParse {
                    path: origin.to_path_buf(),
                    message: "expected a 'repos' array".to_string(),
                })
            }
        },
        _ => {
            return Err(Error::SourceListParse {
                path: origin.to_path_buf(),
                message: "expected an array of sources or an object with 'repos'".to_string(),
            })
        }
    };

    let entries = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| to_entry(index, item))
        .collect::<Result<Vec<_>>>()?;

    SourceList::new(entries)
}

fn to_entry(index: usize, item: Value) -> Result<SourceEntry> {
    let raw: RawEntry =
        serde_json::from_value(item).map_err(|e| invalid(index, None, &e.to_string()))?;

    let name = raw
        .name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| invalid(index, None, "missing required field 'name'"))?;
    let url = raw
        .url
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| invalid(index, Some(&name), "missing required field 'url'"))?;
    let r#ref = raw.r#ref.filter(|r| !r.trim().is_empty());

    Ok(SourceEntry { name, url, r#ref })
}

/// Names become workspace directories, so they must be exactly one plain
/// path component.
fn validate_name(index: usize, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(invalid(index, None, "'name' must not be empty"));
    }
    let mut components = Path::new(name).components();
    let single_normal = matches!(components.next(), Some(Component::Normal(c)) if c == name)
        && components.next().is_none();
    if !single_normal || name.contains(['/', '\\']) {
        return Err(invalid(
            index,
            Some(name),
            "'name' must be a single directory name",
        ));
    }
    Ok(())
}

fn invalid(index: usize, name: Option<&str>, message: &str) -> Error {
    let subject = match name {
        Some(name) => format!("source #{} ('{}')", index, name),
        None => format!("source #{}", index),
    };
    Error::Validation {
        message: format!("{}: {}", subject, message),
    }
}
