//! Compiler Diagnostic Analysis Engine
//!
//! Turns the raw text a C/C++ compiler printed into a deterministic report:
//! - Parse dialect-specific diagnostic lines into structured records
//! - Reconstruct "required from" / "instantiated from" trigger chains
//! - Slice source context around every referenced location
//! - Assemble and persist the report under a stable, content-derived name
//!
//! # Architecture
//!
//! ```text
//! raw output → parser → chain → snippet → report::assemble → report::writer
//!                 ↑
//!              dialect (grammar chosen once per run)
//! ```
//!
//! Nothing in this crate spawns processes; the `quietcc` binary feeds it the
//! captured output of the wrapped compiler.

pub mod chain;
pub mod command;
pub mod config;
pub mod dialect;
pub mod error;
pub mod parser;
pub mod report;
pub mod snippet;

pub use chain::{ChainDedup, ErrorChain};
pub use command::CommandFiles;
pub use config::AnalysisConfig;
pub use dialect::{Dialect, DialectChoice, Grammar};
pub use error::{ReportError, SnippetError};
pub use parser::{Diagnostic, DiagnosticKind, Location};
pub use report::{Report, ReportInput};
pub use snippet::{SnippetExtractor, SourceSnippet};
