//! Compiler diagnostic grammars
//!
//! Each supported compiler family prints diagnostics in its own shape:
//!
//! ```text
//! GCC / Clang:  src/a.cpp:19:23: error: static assertion failed [-Wfoo]
//! MSVC:         src\a.cpp(19): error C2338: static_assert failed
//! ```
//!
//! The grammar for a run is chosen once (config, compiler name, output
//! sniffing) and then handed to the parser and the chain reconstructor, so no
//! other module branches on the compiler family.

use crate::parser::{DiagnosticKind, Location};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

/// Supported diagnostic dialects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    /// GNU g++/gcc: instantiation context printed *before* the error
    Gcc,
    /// clang/clang++: instantiation notes printed *after* the error
    Clang,
    /// Microsoft cl.exe: `file(line): error Cxxxx: message`
    Msvc,
}

impl Dialect {
    /// Every dialect, in the order used when the family cannot be determined
    pub const ALL: [Dialect; 3] = [Dialect::Msvc, Dialect::Gcc, Dialect::Clang];

    /// The compiled grammar for this dialect
    pub fn grammar(self) -> &'static Grammar {
        match self {
            Self::Gcc => &GCC,
            Self::Clang => &CLANG,
            Self::Msvc => &MSVC,
        }
    }

    /// Guess the dialect from the compiler executable name
    pub fn from_compiler(program: &str) -> Option<Self> {
        let stem = Path::new(program)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(program)
            .to_ascii_lowercase();

        if stem == "cl" || stem == "clang-cl" {
            return Some(Self::Msvc);
        }
        if stem.contains("clang") || stem.starts_with("icpx") || stem.starts_with("icx") {
            return Some(Self::Clang);
        }
        if matches!(stem.as_str(), "gcc" | "g++" | "cc" | "c++")
            || stem.ends_with("-gcc")
            || stem.ends_with("-g++")
            || stem.starts_with("gcc-")
            || stem.starts_with("g++-")
        {
            return Some(Self::Gcc);
        }
        None
    }

    /// Guess the dialect from tell-tale text in the compiler output
    pub fn detect_from_output(output: &str) -> Option<Self> {
        if output.contains("Microsoft (R) C/C++ Optimizing Compiler") {
            Some(Self::Msvc)
        } else if output.contains("error generated") || output.contains("errors generated") {
            Some(Self::Clang)
        } else if output.contains("cc1plus:") || output.contains(": note:") {
            Some(Self::Gcc)
        } else {
            None
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gcc => write!(f, "gcc"),
            Self::Clang => write!(f, "clang"),
            Self::Msvc => write!(f, "msvc"),
        }
    }
}

/// Configured dialect: fixed, or resolved per run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialectChoice {
    /// Compiler name first, then output sniffing, then trial parsing
    #[default]
    Auto,
    Gcc,
    Clang,
    Msvc,
}

impl DialectChoice {
    /// Resolve to a concrete dialect for one invocation
    pub fn resolve(self, compiler: &str, output: &str) -> Dialect {
        let fixed = match self {
            Self::Gcc => Some(Dialect::Gcc),
            Self::Clang => Some(Dialect::Clang),
            Self::Msvc => Some(Dialect::Msvc),
            Self::Auto => None,
        };
        if let Some(dialect) = fixed {
            return dialect;
        }
        if let Some(dialect) = Dialect::from_compiler(compiler) {
            tracing::debug!(%dialect, compiler, "Dialect from compiler name");
            return dialect;
        }
        if let Some(dialect) = Dialect::detect_from_output(output) {
            tracing::debug!(%dialect, "Dialect from output signature");
            return dialect;
        }
        // Unknown compiler and no signature: keep the first grammar that finds an error.
        Dialect::ALL
            .into_iter()
            .find(|d| crate::parser::count_errors(output, d.grammar()) > 0)
            .unwrap_or(Dialect::Gcc)
    }
}

impl std::str::FromStr for DialectChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" | "" => Ok(Self::Auto),
            "gcc" | "gnu" => Ok(Self::Gcc),
            "clang" => Ok(Self::Clang),
            "msvc" | "cl" => Ok(Self::Msvc),
            other => Err(format!(
                "unknown dialect '{other}' (expected auto, gcc, clang or msvc)"
            )),
        }
    }
}

/// A diagnostic-start line recognized by a grammar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartMatch {
    pub kind: DiagnosticKind,
    pub location: Location,
    pub message: String,
    pub code: Option<String>,
}

/// Pattern set for one dialect
///
/// All patterns are matched against a line with ANSI escapes removed and
/// surrounding whitespace trimmed.
#[derive(Debug)]
pub struct Grammar {
    /// `error` / `fatal error` / `warning` lines
    start: Regex,
    /// `note` lines carrying a location
    note: Regex,
    /// Any line that begins with a source location
    location: Regex,
    /// Lines introducing the context of the *next* diagnostic
    context_header: Option<Regex>,
    /// Notes that extend a trigger chain by one hop
    trigger: Regex,
    /// Location-bearing notes that neither extend nor stop a trigger scan
    transparent: Option<Regex>,
    /// Note announcing that the following hops are listed outermost-first
    reverse_marker: Option<Regex>,
}

impl Grammar {
    /// Recognize a diagnostic-start line (error, fatal error or warning)
    pub fn match_start(&self, line: &str) -> Option<StartMatch> {
        let caps = self.start.captures(line)?;
        let kind = match &caps["kind"] {
            "warning" => DiagnosticKind::Warning,
            _ => DiagnosticKind::Error,
        };
        Some(StartMatch {
            kind,
            location: location_from(&caps)?,
            message: caps["msg"].trim().to_string(),
            code: caps.name("code").map(|m| m.as_str().to_string()),
        })
    }

    /// Recognize a located note line
    pub fn match_note(&self, line: &str) -> Option<(Location, String)> {
        let caps = self.note.captures(line)?;
        Some((location_from(&caps)?, caps["msg"].trim().to_string()))
    }

    /// Whether the line opens the context block of the next diagnostic
    pub fn is_context_header(&self, line: &str) -> bool {
        self.context_header
            .as_ref()
            .is_some_and(|re| re.is_match(line))
    }

    /// Location of a trigger note, if the line is one
    pub fn trigger_location(&self, line: &str) -> Option<Location> {
        let caps = self.trigger.captures(line)?;
        location_from(&caps)
    }

    /// Whether the line starts with a source location at all
    pub fn has_location(&self, line: &str) -> bool {
        self.location.is_match(line)
    }

    pub fn is_transparent(&self, line: &str) -> bool {
        self.transparent.as_ref().is_some_and(|re| re.is_match(line))
    }

    pub fn is_reverse_marker(&self, line: &str) -> bool {
        self.reverse_marker
            .as_ref()
            .is_some_and(|re| re.is_match(line))
    }
}

fn location_from(caps: &Captures<'_>) -> Option<Location> {
    Some(Location {
        file: caps.name("file")?.as_str().trim().to_string(),
        line: caps.name("line")?.as_str().parse().ok()?,
        column: caps.name("col").and_then(|m| m.as_str().parse().ok()),
    })
}

/// `file:line[:col]:` prefix shared by GCC and Clang
const GNU_LOC: &str = r"(?P<file>.+?):(?P<line>\d+):(?:(?P<col>\d+):)?";

/// `file(line[,col]):` prefix used by MSVC
const MSVC_LOC: &str = r"(?P<file>.+?)\((?P<line>\d+)(?:,(?P<col>\d+))?\)\s*:";

fn gnu_start() -> Regex {
    Regex::new(&format!(
        r"^{GNU_LOC}\s*(?P<kind>fatal error|error|warning):\s*(?P<msg>.*?)(?:\s+\[(?P<code>-[A-Za-z][^\]]*)\])?$"
    ))
    .unwrap()
}

fn gnu_note() -> Regex {
    Regex::new(&format!(r"^{GNU_LOC}\s*note:\s*(?P<msg>.*)$")).unwrap()
}

fn gnu_location() -> Regex {
    Regex::new(&format!(r"^{GNU_LOC}(?:\s|$)")).unwrap()
}

static GCC: LazyLock<Grammar> = LazyLock::new(|| Grammar {
    start: gnu_start(),
    note: gnu_note(),
    location: gnu_location(),
    context_header: Some(
        Regex::new(
            r"^(?:(?:[A-Za-z]:)?[^:]+:\s+(?:In|At)\s.*:$|In (?:instantiation|substitution) of\b|At global scope:|In file included from\b|from\s+\S+:\d+[,:]$)",
        )
        .unwrap(),
    ),
    trigger: Regex::new(&format!(
        r"^{GNU_LOC}\s*(?:note:\s*)?(?:recursively )?(?:required from|required by|instantiated from|in expansion of macro|in definition of macro)"
    ))
    .unwrap(),
    transparent: None,
    reverse_marker: None,
});

static CLANG: LazyLock<Grammar> = LazyLock::new(|| Grammar {
    start: gnu_start(),
    note: gnu_note(),
    location: gnu_location(),
    context_header: Some(Regex::new(r"^In file included from\b").unwrap()),
    trigger: Regex::new(&format!(
        r"^{GNU_LOC}\s*note:\s*(?:in instantiation of|expanded from macro|required from|in expansion of|while substituting|.*\brequested here)"
    ))
    .unwrap(),
    transparent: None,
    reverse_marker: None,
});

static MSVC: LazyLock<Grammar> = LazyLock::new(|| Grammar {
    start: Regex::new(&format!(
        r"^{MSVC_LOC}\s*(?P<kind>fatal error|error|warning)(?:\s+(?P<code>[A-Z]+\d+))?\s*:\s*(?P<msg>.*)$"
    ))
    .unwrap(),
    note: Regex::new(&format!(r"^{MSVC_LOC}\s*note\s*:\s*(?P<msg>.*)$")).unwrap(),
    location: Regex::new(&format!(r"^{MSVC_LOC}")).unwrap(),
    context_header: None,
    trigger: Regex::new(&format!(
        r"^{MSVC_LOC}\s*note\s*:\s*(?:see reference to|while compiling|.*\bbeing compiled\b|in instantiation of|expanded from macro|while substituting|.*\brequested here)"
    ))
    .unwrap(),
    transparent: Some(
        Regex::new(&format!(
            r"^{MSVC_LOC}\s*note\s*:\s*(?:the template instantiation context|see declaration of|see previous definition|could be|or\s)"
        ))
        .unwrap(),
    ),
    reverse_marker: Some(Regex::new(r"\(the oldest one first\)").unwrap()),
});
