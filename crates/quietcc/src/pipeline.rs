//! Wrapper pipeline: one pass from compiler invocation to exit code
//!
//! ```text
//! Invoke ──success──────────────────────────────────────────────→ Done(0)
//!   │  └─spawn failure──────────────────────────────────────────→ Done(127|126)
//!   └→ Parse ──exit 0, nothing escalated──────────────────────→ Done(0)
//!        └→ Reconstruct → Extract → Assemble → Write → Summarize → Done(child)
//! ```
//!
//! Only a spawn failure short-circuits. Every later degradation (missing
//! sources, unwritable report directory) is absorbed and reported.

use crate::invoker::{self, InvokeError, Invocation};
use crate::summary::{ReportStatus, Summary};
use cc_diagnostics::chain::reconstruct;
use cc_diagnostics::command::{absolutize, escalates_warnings, shell_command};
use cc_diagnostics::parser::parse;
use cc_diagnostics::report::{assemble, write_report};
use cc_diagnostics::{AnalysisConfig, Dialect, ReportInput, SnippetExtractor};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Invoke,
    Parse,
    Reconstruct,
    Extract,
    Assemble,
    Write,
    Summarize,
    /// Terminal; the process exits with the recorded code
    Done,
}

impl Stage {
    pub fn is_terminal(self) -> bool {
        self == Self::Done
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invoke => write!(f, "Invoke"),
            Self::Parse => write!(f, "Parse"),
            Self::Reconstruct => write!(f, "Reconstruct"),
            Self::Extract => write!(f, "Extract"),
            Self::Assemble => write!(f, "Assemble"),
            Self::Write => write!(f, "Write"),
            Self::Summarize => write!(f, "Summarize"),
            Self::Done => write!(f, "Done"),
        }
    }
}

fn is_legal_transition(from: Stage, to: Stage) -> bool {
    use Stage::*;

    matches!(
        (from, to),
        (Invoke, Parse)
            | (Invoke, Done)
            | (Parse, Reconstruct)
            | (Parse, Done)
            | (Reconstruct, Extract)
            | (Extract, Assemble)
            | (Assemble, Write)
            | (Write, Summarize)
            | (Summarize, Done)
    )
}

/// Records the stages a run passes through
#[derive(Debug, Clone)]
struct StageTracker {
    visited: Vec<Stage>,
}

impl StageTracker {
    fn new() -> Self {
        Self {
            visited: vec![Stage::Invoke],
        }
    }

    fn current(&self) -> Stage {
        self.visited[self.visited.len() - 1]
    }

    fn advance(&mut self, to: Stage) {
        let from = self.current();
        debug_assert!(is_legal_transition(from, to), "illegal stage transition {from} -> {to}");
        tracing::debug!(from = %from, to = %to, "Stage transition");
        self.visited.push(to);
    }
}

/// Result of one wrapper run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// The child's exit code, or the spawn-failure convention
    pub exit_code: i32,
    /// Set whenever a report was assembled
    pub report: Option<ReportStatus>,
    /// Text for stderr; `None` on a quiet success
    pub console: Option<String>,
    pub dialect: Option<Dialect>,
    pub stages: Vec<Stage>,
}

impl RunOutcome {
    fn quiet(exit_code: i32, dialect: Option<Dialect>, mut tracker: StageTracker) -> Self {
        tracker.advance(Stage::Done);
        Self {
            exit_code,
            report: None,
            console: None,
            dialect,
            stages: tracker.visited,
        }
    }
}

/// Run the compiler in `cwd` and, if it failed, analyze and report
pub async fn run(config: &AnalysisConfig, invocation: &Invocation, cwd: &Path) -> RunOutcome {
    let mut tracker = StageTracker::new();

    let result = match invoker::invoke(invocation, cwd).await {
        Ok(result) => result,
        Err(e) => {
            tracing::warn!(error = %e, "Compiler could not be started");
            tracker.advance(Stage::Done);
            return RunOutcome {
                exit_code: e.exit_code(),
                report: None,
                console: Some(spawn_failure_message(&e)),
                dialect: None,
                stages: tracker.visited,
            };
        }
    };

    let escalate = config.escalate_warnings || escalates_warnings(&invocation.args);
    if result.succeeded() && !escalate {
        return RunOutcome::quiet(0, None, tracker);
    }

    tracker.advance(Stage::Parse);
    let dialect = config.dialect.resolve(&invocation.program, &result.raw_output);
    let grammar = dialect.grammar();
    let diagnostics = parse(&result.raw_output, grammar, escalate);
    if result.succeeded() && !diagnostics.iter().any(|d| d.is_error()) {
        return RunOutcome::quiet(0, Some(dialect), tracker);
    }

    tracker.advance(Stage::Reconstruct);
    let chains = reconstruct(&diagnostics, grammar, config.chain_dedup);

    tracker.advance(Stage::Extract);
    let snippets = SnippetExtractor::new(&result.cwd, config.snippet_radius).extract(&chains);

    tracker.advance(Stage::Assemble);
    let report = assemble(ReportInput {
        command: shell_command(&invocation.program, &invocation.args),
        raw_output: &result.raw_output,
        diagnostics: &diagnostics,
        chains,
        snippets,
        files: &result.files,
        pre_context_lines: config.pre_context_lines,
        post_context_lines: config.post_context_lines,
    });

    tracker.advance(Stage::Write);
    let report_dir = absolutize(&config.report_dir, cwd);
    let status = match write_report(&report, &report_dir) {
        Ok(path) => ReportStatus::Written(path),
        Err(e) => {
            tracing::warn!(error = %e, "Report could not be written");
            ReportStatus::WriteFailed {
                path: report_dir.join(report.file_name()),
                reason: e.to_string(),
                content: report.render(),
            }
        }
    };

    tracker.advance(Stage::Summarize);
    let console = Summary {
        exit_code: result.exit_code,
        report: &status,
        chains: &report.error_chains,
        files: &result.files,
    }
    .render();

    tracker.advance(Stage::Done);
    tracing::debug!(
        exit_code = result.exit_code,
        dialect = %dialect,
        errors = report.error_count(),
        "Run complete"
    );

    RunOutcome {
        exit_code: result.exit_code,
        report: Some(status),
        console: Some(console),
        dialect: Some(dialect),
        stages: tracker.visited,
    }
}

fn spawn_failure_message(err: &InvokeError) -> String {
    match err {
        InvokeError::NotFound { .. } => format!(
            "Error: {err}.\nEnsure the compiler is in your PATH or provide the full path.\n"
        ),
        _ => format!("Error: {err}\n"),
    }
}
