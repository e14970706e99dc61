//! Console summary printed on stderr after a failed build

use cc_diagnostics::{CommandFiles, ErrorChain};
use std::path::PathBuf;

const FRAME: &str = "========================================";

/// What happened to the report file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportStatus {
    Written(PathBuf),
    /// The write failed; the content is dumped to the console instead
    WriteFailed {
        path: PathBuf,
        reason: String,
        content: String,
    },
}

/// Inputs for one summary block
#[derive(Debug, Clone)]
pub struct Summary<'a> {
    pub exit_code: i32,
    pub report: &'a ReportStatus,
    pub chains: &'a [ErrorChain],
    pub files: &'a CommandFiles,
}

impl Summary<'_> {
    pub fn render(&self) -> String {
        let mut lines = vec![FRAME.to_string()];

        if self.exit_code == 0 {
            lines.push(format!(
                "Compilation produced {} escalated diagnostic(s) (exit code 0).",
                self.chains.len()
            ));
        } else {
            lines.push(format!("Compilation failed (exit code {}).", self.exit_code));
        }

        match self.report {
            ReportStatus::Written(path) => lines.push(format!("  Report: {}", path.display())),
            ReportStatus::WriteFailed { path, .. } => {
                lines.push(format!("  Attempted Report: {}", path.display()))
            }
        }

        for (i, chain) in self.chains.iter().enumerate() {
            lines.push(format!("  Error {}: {}", i + 1, chain));
        }
        if !self.files.sources.is_empty() {
            lines.push(format!("  Source(s) in Command: {}", self.files.source_list()));
        }
        if !self.files.binaries.is_empty() {
            lines.push(format!("  Binary(s) in Command: {}", self.files.binary_list()));
        }
        lines.push(format!("  Errors Found: {}", self.chains.len()));

        if let ReportStatus::WriteFailed { reason, .. } = self.report {
            lines.push(format!("  ERROR WRITING REPORT FILE: {reason}"));
        }
        lines.push(FRAME.to_string());

        let mut out = lines.join("\n");
        out.push('\n');
        if let ReportStatus::WriteFailed { content, .. } = self.report {
            out.push_str(content);
            if !content.ends_with('\n') {
                out.push('\n');
            }
        }
        out
    }
}
