//! Error types for the analysis engine
//!
//! Every error here is recoverable: a missing snippet becomes a placeholder
//! and a failed write degrades to printing the report on the console.

use std::path::PathBuf;
use thiserror::Error;

/// Why a source snippet could not be sliced for a location
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SnippetError {
    /// File does not exist (system headers from other sysroots, generated files)
    #[error("source file not found: {path}")]
    NotFound { path: PathBuf },

    /// File exists but could not be read as text
    #[error("cannot read {path}: {message}")]
    Unreadable { path: PathBuf, message: String },

    /// The diagnostic points past the end of the file (or at line 0)
    #[error("line {line} is outside {path} ({len} lines)")]
    LineOutOfRange {
        path: PathBuf,
        line: usize,
        len: usize,
    },
}

/// Failure to persist a report
#[derive(Error, Debug)]
pub enum ReportError {
    /// Report directory missing and could not be created
    #[error("cannot create report directory {dir}: {source}")]
    CreateDir {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing or flushing the temporary report file failed
    #[error("cannot write report in {dir}: {source}")]
    Write {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Moving the finished report over the destination failed
    #[error("cannot replace {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for report persistence
pub type ReportResult<T> = Result<T, ReportError>;
