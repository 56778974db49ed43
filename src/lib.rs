//! # genmsg-workspace Library
//!
//! This library assembles a message-generation workspace from a declarative
//! list of external message repositories and hands it to an external code
//! generator and installer. It backs the `genmsg-workspace` command-line tool.
//!
//! ## Quick Example
//!
//! ```
//! use std::path::Path;
//! use genmsg_workspace::sources;
//!
//! let list = sources::parse(
//!     r#"[{"name": "std_msgs", "url": "https://github.com/ros/std_msgs.git"}]"#,
//!     Path::new("source_list.json"),
//! )
//! .unwrap();
//! assert_eq!(list.len(), 1);
//! assert_eq!(list.entries()[0].name, "std_msgs");
//! ```
//!
//! ## Core Concepts
//!
//! - **Sources (`sources`)**: the source list naming each external repository
//!   and the workspace directory it lands in.
//! - **Fetching (`repository`, `git`)**: idempotent shallow clones into
//!   `workspace_root/<name>`; existing checkouts are never touched.
//! - **Workspace (`workspace`)**: merging a user's custom package into the
//!   workspace and locating message packages inside checkouts.
//! - **Collaborators (`generator`)**: the external generator and installer,
//!   behind traits.
//! - **Pipeline (`pipeline`)**: the fail-fast driver tying it all together,
//!   configured through an explicit `PipelineConfig` (`config`).
//!
//! ## Execution Flow
//!
//! 1.  **Guard**: refuse to run with elevated privileges.
//! 2.  **Resolve**: read and validate the source list.
//! 3.  **Fetch**: clone every source that is not yet in the workspace.
//! 4.  **Merge**: copy the custom package into the workspace, if given.
//! 5.  **Generate and install**: run the generator and installer for each
//!     target package.
//!
//! The workspace persists between runs and acts as the cache: a source is
//! re-cloned only after its directory has been deleted.

pub mod config;
pub mod defaults;
pub mod error;
pub mod generator;
pub mod git;
pub mod output;
pub mod pipeline;
pub mod privilege;
pub mod pythonpath;
pub mod repository;
pub mod sources;
pub mod workspace;
