//! # CLI Command Implementations
//!
//! Each subcommand of the `genmsg-workspace` tool lives in its own file with
//! an `Args` struct derived using `clap` and an `execute` function that calls
//! into the `genmsg_workspace` library. Arguments shared by several commands
//! live in `common`.

pub mod build;
pub mod clone;
pub mod common;
pub mod completions;
pub mod custom;
