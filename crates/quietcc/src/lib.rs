//! quietcc: a quiet compiler wrapper
//!
//! Runs a C/C++ compiler, swallows its output, and when the build fails
//! writes a deterministic `error-<id>.txt` report and prints a short summary.
//!
//! ```text
//! argv → config → invoker ──exit 0──────────────────────────→ Done(0)
//!                    │
//!                    └─ failure → parse → chains → snippets → report → summary → Done(code)
//! ```
//!
//! The analysis itself lives in `cc_diagnostics`; this crate owns process
//! handling, configuration layering, and console output.

pub mod config;
pub mod invoker;
pub mod pipeline;
pub mod summary;

pub use invoker::{CompilationResult, InvokeError, Invocation};
pub use pipeline::{run, RunOutcome, Stage};
