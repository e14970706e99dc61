//! Report persistence
//!
//! The report is written to a temporary file inside the destination
//! directory and then renamed over `error-<id>.txt`. Concurrent builds of the
//! same sources race on the rename; the last one wins and no reader ever sees
//! a half-written file.

use super::Report;
use crate::error::{ReportError, ReportResult};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Write `report` into `dir`, creating the directory when missing
///
/// Returns the destination path (`dir` joined with the report file name).
pub fn write_report(report: &Report, dir: &Path) -> ReportResult<PathBuf> {
    std::fs::create_dir_all(dir).map_err(|source| ReportError::CreateDir {
        dir: dir.to_path_buf(),
        source,
    })?;

    let dest = dir.join(report.file_name());
    let write_err = |source| ReportError::Write {
        dir: dir.to_path_buf(),
        source,
    };

    // Dropped (and deleted) on every early return below.
    let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(report.render().as_bytes()).map_err(write_err)?;
    tmp.flush().map_err(write_err)?;

    tmp.persist(&dest).map_err(|e| ReportError::Persist {
        path: dest.clone(),
        source: e.error,
    })?;

    tracing::debug!(path = %dest.display(), "Report written");
    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn report(id: &str, command: &str) -> Report {
        Report {
            command: command.into(),
            filtered_output: "a.cpp:1:1: error: x\n".into(),
            error_chains: Vec::new(),
            snippets: Vec::new(),
            report_id: id.into(),
        }
    }

    #[test]
    fn test_creates_directory_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let reports = dir.path().join("nested").join("reports");

        let first = write_report(&report("0123456789", "g++ -O0 a.cpp"), &reports).unwrap();
        let second = write_report(&report("0123456789", "g++ -O2 a.cpp"), &reports).unwrap();

        assert_eq!(first, second);
        assert_eq!(first, reports.join("error-0123456789.txt"));
        let text = fs::read_to_string(&second).unwrap();
        assert!(text.contains("g++ -O2 a.cpp"));
        assert!(!text.contains("-O0"));
        assert_eq!(fs::read_dir(&reports).unwrap().count(), 1);
    }

    #[test]
    fn test_unwritable_directory_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "not a directory").unwrap();

        let err = write_report(&report("aaaaaaaaaa", "cc"), &blocker.join("sub")).unwrap_err();
        assert!(matches!(err, ReportError::CreateDir { .. }));
        assert!(err.to_string().contains("cannot create report directory"));
    }
}
