//! Analysis settings
//!
//! Built once at startup and passed by reference through every stage. The
//! `quietcc` binary layers a TOML file and environment variables over
//! [`AnalysisConfig::default`]; library users construct it directly.

use crate::chain::ChainDedup;
use crate::dialect::DialectChoice;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Compiler used when the first argument is already a flag
#[cfg(windows)]
pub const DEFAULT_COMPILER: &str = "cl";
#[cfg(not(windows))]
pub const DEFAULT_COMPILER: &str = "g++";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Lines shown on each side of a referenced source line
    pub snippet_radius: usize,
    /// Raw-output lines kept before the first error
    pub pre_context_lines: usize,
    /// Raw-output lines kept after the first error
    pub post_context_lines: usize,
    /// Directory receiving `error-<id>.txt`
    pub report_dir: PathBuf,
    pub default_compiler: String,
    /// Treat warnings as errors even without `-Werror`
    pub escalate_warnings: bool,
    pub chain_dedup: ChainDedup,
    pub dialect: DialectChoice,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            snippet_radius: 25,
            pre_context_lines: 3,
            post_context_lines: 6,
            report_dir: PathBuf::from("."),
            default_compiler: DEFAULT_COMPILER.to_string(),
            escalate_warnings: false,
            chain_dedup: ChainDedup::Keep,
            dialect: DialectChoice::Auto,
        }
    }
}
