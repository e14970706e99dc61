//! Diagnostic parsing
//!
//! Splits captured compiler text into classified [`Diagnostic`] records.
//! Lines that follow a diagnostic start (notes, code excerpts, caret markers)
//! are kept verbatim in that diagnostic's raw block; context headers such as
//! GCC's `In instantiation of ...:` start a block that is attached to the
//! *next* diagnostic instead.

use crate::dialect::Grammar;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Colour and hyperlink escapes emitted with `-fdiagnostics-color=always`
static ANSI_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1b\[[0-9;?]*[ -/]*[@-~]|\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)").unwrap()
});

/// Severity of a diagnostic record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    Error,
    Warning,
    Note,
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Note => write!(f, "note"),
        }
    }
}

/// A position in a source file as printed by the compiler
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// Path exactly as the compiler printed it
    pub file: String,
    /// 1-based line number
    pub line: usize,
    /// 1-based column, when the dialect prints one
    pub column: Option<usize>,
}

impl Location {
    pub fn new(file: impl Into<String>, line: usize) -> Self {
        Self {
            file: file.into(),
            line,
            column: None,
        }
    }

    /// Same file and line, ignoring the column
    pub fn same_line(&self, other: &Location) -> bool {
        self.file == other.file && self.line == other.line
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// One compiler-emitted message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub location: Location,
    pub message: String,
    /// MSVC code (`C2338`) or GCC/Clang flag (`-Wunused-variable`)
    pub code: Option<String>,
    /// Start line followed by its continuation lines, verbatim
    pub raw_block: Vec<String>,
    /// Context-header block printed before the start line, verbatim
    pub leading_context: Vec<String>,
    /// 0-based index of the start line in the raw output
    pub stream_line: usize,
    /// 0-based index of the first leading-context line (== `stream_line` when none)
    pub context_line: usize,
    /// A warning promoted to an error by configuration or `-Werror`
    pub escalated: bool,
}

impl Diagnostic {
    /// Whether this record counts toward "Errors Found"
    pub fn is_error(&self) -> bool {
        self.kind == DiagnosticKind::Error
    }

    /// Continuation lines after the start line
    pub fn continuation(&self) -> &[String] {
        self.raw_block.get(1..).unwrap_or_default()
    }

    pub fn raw_text(&self) -> String {
        self.raw_block.join("\n")
    }
}

/// Remove colour escapes and surrounding whitespace before pattern matching
pub fn clean_line(line: &str) -> String {
    ANSI_PATTERN.replace_all(line, "").trim().to_string()
}

/// Parse raw compiler output with one grammar
///
/// Warnings are dropped unless `escalate_warnings` is set, in which case they
/// are emitted as errors. Text matching nothing yields an empty Vec.
pub fn parse(raw: &str, grammar: &Grammar, escalate_warnings: bool) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let mut current: Option<Diagnostic> = None;
    let mut pending: Vec<String> = Vec::new();
    let mut pending_line: Option<usize> = None;

    let flush = |diag: Option<Diagnostic>, out: &mut Vec<Diagnostic>| {
        let Some(mut diag) = diag else { return };
        match diag.kind {
            DiagnosticKind::Warning if !escalate_warnings => {
                tracing::trace!(location = %diag.location, "Dropping warning");
            }
            DiagnosticKind::Warning => {
                diag.kind = DiagnosticKind::Error;
                diag.escalated = true;
                out.push(diag);
            }
            _ => out.push(diag),
        }
    };

    for (idx, raw_line) in raw.lines().enumerate() {
        let line = clean_line(raw_line);

        if let Some(start) = grammar.match_start(&line) {
            flush(current.take(), &mut diagnostics);
            current = Some(Diagnostic {
                kind: start.kind,
                location: start.location,
                message: start.message,
                code: start.code,
                raw_block: vec![raw_line.to_string()],
                leading_context: std::mem::take(&mut pending),
                stream_line: idx,
                context_line: pending_line.take().unwrap_or(idx),
                escalated: false,
            });
            continue;
        }

        if grammar.is_context_header(&line) {
            flush(current.take(), &mut diagnostics);
            pending_line.get_or_insert(idx);
            pending.push(raw_line.to_string());
            continue;
        }

        if !pending.is_empty() {
            pending.push(raw_line.to_string());
            continue;
        }

        let open_note = current
            .as_ref()
            .map_or(true, |d| d.kind == DiagnosticKind::Note);
        if open_note {
            if let Some((location, message)) = grammar.match_note(&line) {
                flush(current.take(), &mut diagnostics);
                current = Some(Diagnostic {
                    kind: DiagnosticKind::Note,
                    location,
                    message,
                    code: None,
                    raw_block: vec![raw_line.to_string()],
                    leading_context: Vec::new(),
                    stream_line: idx,
                    context_line: idx,
                    escalated: false,
                });
                continue;
            }
        }

        if let Some(diag) = current.as_mut() {
            diag.raw_block.push(raw_line.to_string());
        }
    }
    flush(current.take(), &mut diagnostics);

    tracing::debug!(
        records = diagnostics.len(),
        errors = diagnostics.iter().filter(|d| d.is_error()).count(),
        "Parsed compiler output"
    );
    diagnostics
}

/// Number of error-kind start lines a grammar recognizes in the text
pub fn count_errors(raw: &str, grammar: &Grammar) -> usize {
    raw.lines()
        .filter_map(|l| grammar.match_start(&clean_line(l)))
        .filter(|m| m.kind == DiagnosticKind::Error)
        .count()
}
