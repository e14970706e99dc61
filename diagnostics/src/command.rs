//! Compiler command-line inspection
//!
//! Finds the source and object/binary files named on a compiler command line
//! and derives the report id from them. Only file extensions are inspected;
//! nothing here knows what individual compiler flags mean, apart from the two
//! that turn warnings into errors.

use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// Extensions of translation units
pub const SOURCE_EXTENSIONS: &[&str] = &["c", "cc", "cpp", "cxx", "c++", "cp"];

/// Extensions of compiler or linker outputs
pub const BINARY_EXTENSIONS: &[&str] = &["o", "obj", "a", "lib", "so", "dll", "dylib", "exe"];

/// MSVC output options that glue the file name onto the flag (`/Fomain.obj`)
const MSVC_OUTPUT_PREFIXES: &[&str] = &["/Fo:", "/Fe:", "/Fo", "/Fe"];

/// Number of hex characters kept from the digest
const REPORT_ID_LEN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileRole {
    Source,
    Binary,
}

/// Files a compiler command line mentions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandFiles {
    /// Absolute source paths, deduplicated, in command-line order
    pub sources: Vec<PathBuf>,
    /// Object and binary paths relative to the working directory, deduplicated
    pub binaries: Vec<PathBuf>,
}

impl CommandFiles {
    /// Classify `args` (compiler arguments, without the compiler itself)
    pub fn from_args<S: AsRef<str>>(args: &[S], cwd: &Path) -> Self {
        let mut files = Self::default();
        for arg in args {
            let arg = strip_msvc_output_prefix(arg.as_ref());
            let Some(role) = classify(arg) else { continue };
            match role {
                FileRole::Source => {
                    let path = absolutize(Path::new(arg), cwd);
                    if !files.sources.contains(&path) {
                        files.sources.push(path);
                    }
                }
                FileRole::Binary => {
                    let path = relative_to(&absolutize(Path::new(arg), cwd), cwd);
                    if !files.binaries.contains(&path) {
                        files.binaries.push(path);
                    }
                }
            }
        }
        files
    }

    /// First ten hex chars of a BLAKE3 digest over the sorted source set
    ///
    /// Falls back to the binary set when the command names no source, so a
    /// link step still gets a stable name.
    pub fn report_id(&self) -> String {
        let basis = if self.sources.is_empty() {
            &self.binaries
        } else {
            &self.sources
        };
        let mut names: Vec<String> = basis
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();
        names.sort();
        names.dedup();

        let digest = blake3::hash(names.join("\n").as_bytes());
        digest.to_hex().as_str()[..REPORT_ID_LEN].to_string()
    }

    /// `error-<id>.txt`
    pub fn report_file_name(&self) -> String {
        format!("error-{}.txt", self.report_id())
    }

    pub fn source_list(&self) -> String {
        join_paths(&self.sources)
    }

    pub fn binary_list(&self) -> String {
        join_paths(&self.binaries)
    }
}

/// Whether the command itself promotes warnings to errors
pub fn escalates_warnings<S: AsRef<str>>(args: &[S]) -> bool {
    args.iter()
        .any(|a| matches!(a.as_ref(), "-Werror" | "/WX" | "-WX"))
}

/// Shell-quoted rendering of the full command, suitable for copy-paste
pub fn shell_command<S: AsRef<str>>(program: &str, args: &[S]) -> String {
    let words: Vec<&str> = std::iter::once(program)
        .chain(args.iter().map(AsRef::as_ref))
        .collect();
    // Only fails on interior NUL bytes, which a real argv cannot carry.
    shlex::try_join(words.iter().copied()).unwrap_or_else(|_| words.join(" "))
}

fn classify(arg: &str) -> Option<FileRole> {
    if arg.is_empty() || arg.starts_with('-') {
        return None;
    }
    let ext = Path::new(arg).extension()?.to_str()?.to_ascii_lowercase();
    if SOURCE_EXTENSIONS.contains(&ext.as_str()) {
        Some(FileRole::Source)
    } else if BINARY_EXTENSIONS.contains(&ext.as_str()) {
        Some(FileRole::Binary)
    } else {
        None
    }
}

fn strip_msvc_output_prefix(arg: &str) -> &str {
    MSVC_OUTPUT_PREFIXES
        .iter()
        .find_map(|prefix| arg.strip_prefix(*prefix))
        .filter(|rest| !rest.is_empty())
        .unwrap_or(arg)
}

/// Join onto `cwd` and drop `.` / `..` components lexically; the file need
/// not exist yet.
pub fn absolutize(path: &Path, cwd: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    };
    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

fn relative_to(path: &Path, cwd: &Path) -> PathBuf {
    path.strip_prefix(cwd)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
