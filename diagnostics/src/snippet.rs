//! Source snippet extraction
//!
//! Slices a window of source lines around every location named by the error
//! chains. Files are read once per run and cached, including failed reads,
//! so a header referenced by twenty hops costs one read.

use crate::chain::ErrorChain;
use crate::error::SnippetError;
use crate::parser::Location;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// One numbered source line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetLine {
    pub number: usize,
    pub text: String,
}

/// Source context around one referenced location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSnippet {
    /// Path as the compiler printed it
    pub file: String,
    pub center_line: usize,
    pub radius: usize,
    /// The window, or the reason it could not be produced
    pub lines: Result<Vec<SnippetLine>, SnippetError>,
}

impl SourceSnippet {
    pub fn is_available(&self) -> bool {
        self.lines.is_ok()
    }

    /// First and last line numbers of the window
    pub fn span(&self) -> Option<(usize, usize)> {
        let lines = self.lines.as_ref().ok()?;
        Some((lines.first()?.number, lines.last()?.number))
    }

    /// Report section text: a header comment followed by `N: text` lines
    pub fn render(&self) -> String {
        match (&self.lines, self.span()) {
            (Ok(lines), Some((first, last))) => {
                let mut out = format!(
                    "// Source code from {} lines {} to {}:\n",
                    self.file, first, last
                );
                for line in lines {
                    out.push_str(&format!("{}: {}\n", line.number, line.text));
                }
                out
            }
            (Ok(_), None) => format!("// Source code from {} is empty\n", self.file),
            (Err(reason), _) => format!(
                "// Source code from {} around line {} unavailable: {}\n",
                self.file, self.center_line, reason
            ),
        }
    }
}

/// Caching snippet reader rooted at the compiler's working directory
pub struct SnippetExtractor {
    base_dir: PathBuf,
    radius: usize,
    cache: HashMap<PathBuf, Result<Vec<String>, SnippetError>>,
}

impl SnippetExtractor {
    pub fn new(base_dir: impl AsRef<Path>, radius: usize) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
            radius,
            cache: HashMap::new(),
        }
    }

    /// One snippet per distinct (file, line) across all chains, in
    /// first-appearance order
    pub fn extract(&mut self, chains: &[ErrorChain]) -> Vec<SourceSnippet> {
        let mut seen = HashSet::new();
        let snippets: Vec<SourceSnippet> = chains
            .iter()
            .flat_map(|chain| chain.locations())
            .filter(|loc| seen.insert((loc.file.clone(), loc.line)))
            .map(|loc| self.snippet(loc))
            .collect();

        tracing::debug!(
            snippets = snippets.len(),
            files_read = self.cache.len(),
            unavailable = snippets.iter().filter(|s| !s.is_available()).count(),
            "Extracted source snippets"
        );
        snippets
    }

    /// Window `[max(1, L - r), min(n, L + r)]` around one location
    pub fn snippet(&mut self, location: &Location) -> SourceSnippet {
        let radius = self.radius;
        let path = self.resolve(&location.file);
        let lines = self.read_lines(&path).and_then(|content| {
            let len = content.len();
            let center = location.line;
            if center == 0 || center > len {
                return Err(SnippetError::LineOutOfRange {
                    path: path.clone(),
                    line: center,
                    len,
                });
            }
            let first = center.saturating_sub(radius).max(1);
            let last = center.saturating_add(radius).min(len);
            Ok((first..=last)
                .map(|number| SnippetLine {
                    number,
                    text: content[number - 1].clone(),
                })
                .collect())
        });

        if let Err(reason) = &lines {
            match reason {
                SnippetError::NotFound { .. } => {
                    tracing::debug!(location = %location, "Snippet source missing");
                }
                _ => tracing::warn!(location = %location, error = %reason, "Snippet unavailable"),
            }
        }

        SourceSnippet {
            file: location.file.clone(),
            center_line: location.line,
            radius,
            lines,
        }
    }

    /// Number of files read so far (successfully or not)
    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }

    fn resolve(&self, file: &str) -> PathBuf {
        let path = Path::new(file);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    fn read_lines(&mut self, path: &Path) -> Result<&Vec<String>, SnippetError> {
        self.cache
            .entry(path.to_path_buf())
            .or_insert_with(|| load(path))
            .as_ref()
            .map_err(Clone::clone)
    }
}

fn load(path: &Path) -> Result<Vec<String>, SnippetError> {
    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => SnippetError::NotFound {
            path: path.to_path_buf(),
        },
        _ => SnippetError::Unreadable {
            path: path.to_path_buf(),
            message: e.to_string(),
        },
    })?;
    Ok(String::from_utf8_lossy(&bytes)
        .lines()
        .map(|l| l.trim_end().to_string())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn chain(locs: &[(&str, usize)]) -> ErrorChain {
        let (first, rest) = locs.split_first().unwrap();
        ErrorChain::new(
            Location::new(first.0, first.1),
            rest.iter().map(|(f, l)| Location::new(*f, *l)),
            "boom",
        )
    }

    #[test]
    fn test_window_clamps_to_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("five.cpp"), "a\nb\nc\nd\ne\n").unwrap();

        let mut extractor = SnippetExtractor::new(dir.path(), 25);
        let snippet = extractor.snippet(&Location::new("five.cpp", 3));
        assert_eq!(snippet.span(), Some((1, 5)));
        assert_eq!(snippet.lines.unwrap()[2].text, "c");
    }

    #[test]
    fn test_huge_radius_covers_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("five.cpp"), "a\nb\nc\nd\ne\n").unwrap();

        let mut extractor = SnippetExtractor::new(dir.path(), usize::MAX);
        let snippet = extractor.snippet(&Location::new("five.cpp", 4));
        assert_eq!(snippet.span(), Some((1, 5)));
    }

    #[test]
    fn test_window_radius() {
        let dir = tempfile::tempdir().unwrap();
        let body: String = (1..=100).map(|i| format!("line {i}\n")).collect();
        fs::write(dir.path().join("big.cpp"), body).unwrap();

        let mut extractor = SnippetExtractor::new(dir.path(), 2);
        let snippet = extractor.snippet(&Location::new("big.cpp", 50));
        assert_eq!(snippet.span(), Some((48, 52)));
        let rendered = snippet.render();
        assert!(rendered.starts_with("// Source code from big.cpp lines 48 to 52:\n"));
        assert!(rendered.contains("50: line 50\n"));
    }

    #[test]
    fn test_distinct_locations_read_each_file_once() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.h"), "x\ny\nz\n").unwrap();
        fs::write(dir.path().join("a.cpp"), "1\n2\n3\n4\n").unwrap();

        let chains = vec![
            chain(&[("a.h", 2), ("a.cpp", 4)]),
            chain(&[("a.h", 2), ("a.h", 3)]),
        ];
        let mut extractor = SnippetExtractor::new(dir.path(), 1);
        let snippets = extractor.extract(&chains);
        let keys: Vec<(&str, usize)> = snippets
            .iter()
            .map(|s| (s.file.as_str(), s.center_line))
            .collect();
        assert_eq!(keys, vec![("a.h", 2), ("a.cpp", 4), ("a.h", 3)]);
        assert_eq!(extractor.cache_size(), 2);
    }

    #[test]
    fn test_unavailable_sources_become_placeholders() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("short.cpp"), "only\n").unwrap();

        let mut extractor = SnippetExtractor::new(dir.path(), 3);
        let missing = extractor.snippet(&Location::new("gone.h", 4));
        assert!(matches!(missing.lines, Err(SnippetError::NotFound { .. })));
        assert!(missing.render().contains("gone.h around line 4 unavailable"));

        let past_end = extractor.snippet(&Location::new("short.cpp", 9));
        assert!(matches!(
            past_end.lines,
            Err(SnippetError::LineOutOfRange { line: 9, len: 1, .. })
        ));
        let zero = extractor.snippet(&Location::new("short.cpp", 0));
        assert!(!zero.is_available());
    }

    #[test]
    fn test_absolute_paths_ignore_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("abs.cpp");
        fs::write(&file, "one\ntwo\n").unwrap();

        let mut extractor = SnippetExtractor::new("/nonexistent-base", 0);
        let snippet = extractor.snippet(&Location::new(file.to_string_lossy(), 2));
        assert_eq!(snippet.span(), Some((2, 2)));
    }
}
