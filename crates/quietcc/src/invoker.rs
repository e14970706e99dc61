//! Compiler process invocation
//!
//! Spawns the compiler with its original arguments and drains stdout and
//! stderr on two reader tasks while it runs. Every captured line is stamped
//! from one shared counter so the merged transcript approximates the order
//! in which the compiler produced it; only per-stream order is exact.

use cc_diagnostics::CommandFiles;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;

/// Shell convention for "command not found"
pub const EXIT_NOT_FOUND: i32 = 127;
/// Shell convention for "found but not executable"
pub const EXIT_CANNOT_EXECUTE: i32 = 126;

#[derive(Error, Debug)]
pub enum InvokeError {
    #[error("Compiler '{program}' not found")]
    NotFound {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Compiler '{program}' could not be started: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Lost track of compiler '{program}': {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

impl InvokeError {
    /// Exit code the wrapper reports, since no child exit code exists
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotFound { .. } => EXIT_NOT_FOUND,
            Self::Spawn { .. } => EXIT_CANNOT_EXECUTE,
            Self::Wait { .. } => 1,
        }
    }
}

/// The compiler to run and its arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    /// Split wrapper argv into compiler and arguments
    ///
    /// When the first argument is already a flag (`quietcc -c a.cpp`), the
    /// default compiler is run with every argument passed through.
    pub fn from_argv(argv: Vec<String>, default_compiler: &str) -> Option<Self> {
        let first = argv.first()?;
        if first.starts_with('-') {
            Some(Self {
                program: default_compiler.to_string(),
                args: argv,
            })
        } else {
            let mut argv = argv.into_iter();
            let program = argv.next()?;
            Some(Self {
                program,
                args: argv.collect(),
            })
        }
    }
}

/// A line read from one of the child's streams
#[derive(Debug, Clone, PartialEq, Eq)]
struct StampedLine {
    seq: u64,
    text: String,
}

/// Everything observed about one compiler run
#[derive(Debug, Clone)]
pub struct CompilationResult {
    pub exit_code: i32,
    /// stdout and stderr merged in capture order
    pub raw_output: String,
    pub stdout: String,
    pub stderr: String,
    pub files: CommandFiles,
    pub cwd: PathBuf,
}

impl CompilationResult {
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }
}

/// Run `invocation` in `cwd` and capture its output
pub async fn invoke(invocation: &Invocation, cwd: &Path) -> Result<CompilationResult, InvokeError> {
    let program = invocation.program.clone();
    let mut child = Command::new(&invocation.program)
        .args(&invocation.args)
        .current_dir(cwd)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => InvokeError::NotFound {
                program: program.clone(),
                source,
            },
            _ => InvokeError::Spawn {
                program: program.clone(),
                source,
            },
        })?;

    tracing::debug!(program = %program, args = invocation.args.len(), "Compiler started");

    let seq = Arc::new(AtomicU64::new(0));
    let stdout_task = child
        .stdout
        .take()
        .map(|out| spawn_reader(out, Arc::clone(&seq), "stdout"));
    let stderr_task = child
        .stderr
        .take()
        .map(|err| spawn_reader(err, Arc::clone(&seq), "stderr"));

    let status = child.wait().await.map_err(|source| InvokeError::Wait {
        program: program.clone(),
        source,
    })?;

    let stdout_lines = collect(stdout_task).await;
    let stderr_lines = collect(stderr_task).await;

    let exit_code = exit_code_of(status);
    tracing::debug!(
        program = %program,
        exit_code,
        stdout_lines = stdout_lines.len(),
        stderr_lines = stderr_lines.len(),
        "Compiler finished"
    );

    Ok(CompilationResult {
        exit_code,
        raw_output: merge(&stdout_lines, &stderr_lines),
        stdout: join_lines(stdout_lines.iter()),
        stderr: join_lines(stderr_lines.iter()),
        files: CommandFiles::from_args(&invocation.args, cwd),
        cwd: cwd.to_path_buf(),
    })
}

fn spawn_reader<R>(stream: R, seq: Arc<AtomicU64>, name: &'static str) -> JoinHandle<Vec<StampedLine>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut lines = Vec::new();
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    let text = String::from_utf8_lossy(&buf);
                    lines.push(StampedLine {
                        seq: seq.fetch_add(1, Ordering::SeqCst),
                        text: text.trim_end_matches(['\n', '\r']).to_string(),
                    });
                }
                Err(e) => {
                    tracing::warn!(stream = name, error = %e, "Stopped reading compiler output");
                    break;
                }
            }
        }
        lines
    })
}

async fn collect(task: Option<JoinHandle<Vec<StampedLine>>>) -> Vec<StampedLine> {
    let Some(task) = task else { return Vec::new() };
    match task.await {
        Ok(lines) => lines,
        Err(e) => {
            tracing::warn!(error = %e, "Output reader task failed");
            Vec::new()
        }
    }
}

/// Interleave both streams by capture stamp
fn merge(stdout: &[StampedLine], stderr: &[StampedLine]) -> String {
    let mut all: Vec<&StampedLine> = stdout.iter().chain(stderr.iter()).collect();
    all.sort_by_key(|line| line.seq);
    join_lines(all.into_iter())
}

fn join_lines<'a>(lines: impl Iterator<Item = &'a StampedLine>) -> String {
    let mut out = String::new();
    for line in lines {
        out.push_str(&line.text);
        out.push('\n');
    }
    out
}

#[cfg(unix)]
fn exit_code_of(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|sig| 128 + sig))
        .unwrap_or(1)
}

#[cfg(not(unix))]
fn exit_code_of(status: ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}
