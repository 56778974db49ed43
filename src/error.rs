//! # Error Handling
//!
//! This module defines the centralized error type for `genmsg-workspace`. It
//! uses `thiserror` to describe every failure the pipeline can surface, each
//! carrying enough context (paths, URLs, tool names) to be reported directly
//! to the user.
//!
//! Every error aborts the pipeline. Nothing is retried internally, and
//! repositories fetched before the failure stay on disk for the next run.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for workspace operations
#[derive(Error, Debug)]
pub enum Error {
    /// The source list file does not exist.
    #[error("Source list not found: {}", path.display())]
    SourceListNotFound { path: PathBuf },

    /// The source list is not well-formed JSON or has an unexpected shape.
    #[error("Source list parse error in {}: {message}", path.display())]
    SourceListParse { path: PathBuf, message: String },

    /// A source entry, argument or configuration value failed validation.
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Cloning an external repository failed.
    #[error("Fetch error for {url}{}: {message}{}",
        r#ref.as_ref().map(|r| format!("@{}", r)).unwrap_or_default(),
        hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    Fetch {
        url: String,
        r#ref: Option<String>,
        message: String,
        /// Optional hint for how to resolve the clone issue
        hint: Option<String>,
    },

    /// Copying the custom package into the workspace failed.
    #[error("Copy error: {} -> {}: {message}", src.display(), dst.display())]
    Copy {
        src: PathBuf,
        dst: PathBuf,
        message: String,
    },

    /// An external tool (generator or installer) failed.
    ///
    /// `code` is the tool's exit status, or `None` when it could not be
    /// spawned or was terminated by a signal.
    #[error("External tool '{tool}' failed{}: {message}",
        code.map(|c| format!(" with exit code {}", c)).unwrap_or_default())]
    ExternalTool {
        tool: String,
        code: Option<i32>,
        message: String,
    },

    /// The process runs with privileges the pipeline refuses to use.
    #[error("Privilege error: {message}")]
    Privilege { message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Process exit code this error should terminate the binary with.
    ///
    /// External tool failures propagate the tool's own status; everything
    /// else maps to 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::ExternalTool {
                code: Some(code), ..
            } if *code != 0 => *code,
            _ => 1,
        }
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
