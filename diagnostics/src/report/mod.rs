//! Report assembly
//!
//! A report is rebuilt from scratch on every failing run. Its layout is
//! fixed so that the same compiler output always renders the same text:
//!
//! ```text
//! Command:
//! g++ -c main.cpp
//!
//! ==== Filtered Compiler Output (First Error + Context) ====
//! <raw lines around the first error, or everything when none was parsed>
//!
//! ==== Error Chains ====
//! Error 1: serializer.h:19 -> main.cpp:48
//! Errors Found: 1
//!
//! // Source code from serializer.h lines 1 to 44:
//! 1: #pragma once
//! ...
//! ```

pub mod writer;

use crate::chain::ErrorChain;
use crate::command::CommandFiles;
use crate::parser::Diagnostic;
use crate::snippet::SourceSnippet;

pub use writer::write_report;

const RULE: &str = "====================";

/// Everything the assembler needs, produced by the earlier stages
#[derive(Debug, Clone)]
pub struct ReportInput<'a> {
    /// Shell-quoted compiler command
    pub command: String,
    /// Captured compiler output, stdout and stderr merged
    pub raw_output: &'a str,
    pub diagnostics: &'a [Diagnostic],
    pub chains: Vec<ErrorChain>,
    pub snippets: Vec<SourceSnippet>,
    pub files: &'a CommandFiles,
    pub pre_context_lines: usize,
    pub post_context_lines: usize,
}

/// A fully assembled report, ready to render or persist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub command: String,
    pub filtered_output: String,
    pub error_chains: Vec<ErrorChain>,
    pub snippets: Vec<SourceSnippet>,
    /// Ten hex chars naming the report file
    pub report_id: String,
}

impl Report {
    /// `error-<id>.txt`
    pub fn file_name(&self) -> String {
        format!("error-{}.txt", self.report_id)
    }

    pub fn error_count(&self) -> usize {
        self.error_chains.len()
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("Command:\n");
        out.push_str(&self.command);
        out.push_str("\n\n");

        out.push_str(&format!(
            "{RULE} Filtered Compiler Output (First Error + Context) {RULE}\n"
        ));
        out.push_str(&self.filtered_output);
        if !self.filtered_output.ends_with('\n') {
            out.push('\n');
        }

        out.push_str(&format!("\n{RULE} Error Chains {RULE}\n"));
        for (i, chain) in self.error_chains.iter().enumerate() {
            out.push_str(&format!("Error {}: {}\n", i + 1, chain));
        }
        out.push_str(&format!("Errors Found: {}\n", self.error_count()));

        for snippet in &self.snippets {
            out.push('\n');
            out.push_str(&snippet.render());
        }
        out
    }
}

/// Build a [`Report`] from the outputs of the earlier stages
pub fn assemble(input: ReportInput<'_>) -> Report {
    let filtered_output = filter_output(
        input.raw_output,
        input.diagnostics,
        input.pre_context_lines,
        input.post_context_lines,
    );
    let report = Report {
        command: input.command,
        filtered_output,
        error_chains: input.chains,
        snippets: input.snippets,
        report_id: input.files.report_id(),
    };
    tracing::debug!(
        report_id = %report.report_id,
        chains = report.error_chains.len(),
        snippets = report.snippets.len(),
        "Assembled report"
    );
    report
}

/// Raw lines around the first error, or the whole text when none was found
///
/// The window opens `pre` lines before the error's context block (or start
/// line when it has none) and closes `post` lines after its start line.
pub fn filter_output(raw: &str, diagnostics: &[Diagnostic], pre: usize, post: usize) -> String {
    let Some(first) = diagnostics.iter().find(|d| d.is_error()) else {
        return raw.to_string();
    };
    let lines: Vec<&str> = raw.lines().collect();
    if lines.is_empty() {
        return String::new();
    }
    let start = first.context_line.min(first.stream_line).saturating_sub(pre);
    let end = first.stream_line.saturating_add(post).min(lines.len() - 1);
    lines[start..=end].join("\n")
}
