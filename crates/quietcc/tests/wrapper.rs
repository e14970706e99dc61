//! Drives the built `quietcc` binary against shell-script stand-ins for a
//! compiler.
#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const HEADER: &str = "\
#pragma once
template <typename T>
struct Serializer {
    static void serialize(const T& v) {
        v.serialize();
    }
};
";

const MAIN: &str = "\
#include \"serializer.h\"
struct Plain {};
int main() {
    Plain p;
    Serializer<Plain>::serialize(p);
    return 0;
}
";

const TEMPLATE_FAILURE: &str = "\
serializer.h: In instantiation of 'static void Serializer<T>::serialize(const T&) [with T = Plain]':
main.cpp:5:33:   required from here
serializer.h:5:11: error: 'const struct Plain' has no member named 'serialize'
    5 |         v.serialize();
      |         ~~^~~~~~~~~
";

/// Write an executable script that prints `stderr_text` and exits with `code`
fn fake_compiler(dir: &Path, name: &str, stderr_text: &str, code: i32) -> PathBuf {
    let path = dir.join(name);
    let script = format!("#!/bin/sh\ncat >&2 <<'QUIETCC_EOF'\n{stderr_text}QUIETCC_EOF\nexit {code}\n");
    fs::write(&path, script).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn project() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("serializer.h"), HEADER).unwrap();
    fs::write(dir.path().join("main.cpp"), MAIN).unwrap();
    dir
}

fn quietcc(dir: &Path, args: &[&str], envs: &[(&str, &str)]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_quietcc"));
    cmd.current_dir(dir).args(args);
    for key in [
        "QUIETCC_CONFIG",
        "QUIETCC_LOG",
        "QUIETCC_SNIPPET_RADIUS",
        "QUIETCC_PRE_CONTEXT_LINES",
        "QUIETCC_POST_CONTEXT_LINES",
        "QUIETCC_DEFAULT_COMPILER",
        "QUIETCC_ESCALATE_WARNINGS",
        "QUIETCC_CHAIN_DEDUP",
        "QUIETCC_DIALECT",
    ] {
        cmd.env_remove(key);
    }
    cmd.env("QUIETCC_REPORT_DIR", "reports");
    for (k, v) in envs {
        cmd.env(k, v);
    }
    cmd.output().unwrap()
}

fn reports(dir: &Path) -> Vec<PathBuf> {
    match fs::read_dir(dir.join("reports")) {
        Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
        Err(_) => Vec::new(),
    }
}

#[test]
fn test_failed_template_build_writes_report_and_summary() {
    let dir = project();
    let cc = fake_compiler(dir.path(), "fake-g++", TEMPLATE_FAILURE, 1);
    let out = quietcc(dir.path(), &[cc.to_str().unwrap(), "-c", "main.cpp", "-o", "main.o"], &[]);

    assert_eq!(out.status.code(), Some(1));
    assert!(out.stdout.is_empty());
    let stderr = String::from_utf8(out.stderr).unwrap();
    assert!(stderr.contains("Compilation failed (exit code 1)."));
    assert!(stderr.contains("  Error 1: serializer.h:5 -> main.cpp:5\n"));
    assert!(stderr.contains("  Binary(s) in Command: main.o\n"));
    assert!(stderr.contains("  Errors Found: 1\n"));

    let files = reports(dir.path());
    assert_eq!(files.len(), 1);
    let name = files[0].file_name().unwrap().to_str().unwrap().to_string();
    assert!(name.starts_with("error-") && name.ends_with(".txt"));
    let report_line = stderr.lines().find(|l| l.starts_with("  Report: /")).unwrap();
    assert!(report_line.ends_with(&format!("/reports/{name}")));

    let report = fs::read_to_string(&files[0]).unwrap();
    assert!(report.contains("// Source code from serializer.h lines 1 to 7:"));
    assert!(report.contains("// Source code from main.cpp lines 1 to 7:"));
}

#[test]
fn test_successful_build_is_silent() {
    let dir = project();
    let cc = fake_compiler(
        dir.path(),
        "fake-g++",
        "main.cpp:4:11: warning: unused variable 'p' [-Wunused-variable]\n",
        0,
    );
    let out = quietcc(dir.path(), &[cc.to_str().unwrap(), "-c", "main.cpp"], &[]);

    assert_eq!(out.status.code(), Some(0));
    assert!(out.stdout.is_empty());
    assert!(out.stderr.is_empty());
    assert!(reports(dir.path()).is_empty());
}

#[test]
fn test_unparsed_failure_keeps_full_output() {
    let dir = project();
    let text = "ld: cannot find -lmissing\ncollect2: error: ld returned 1 exit status\n";
    let cc = fake_compiler(dir.path(), "fake-g++", text, 3);
    let out = quietcc(dir.path(), &[cc.to_str().unwrap(), "main.o", "-lmissing"], &[]);

    assert_eq!(out.status.code(), Some(3));
    let stderr = String::from_utf8(out.stderr).unwrap();
    assert!(stderr.contains("Compilation failed (exit code 3)."));
    assert!(stderr.contains("  Errors Found: 0\n"));
    assert!(!stderr.contains("Error 1:"));

    let files = reports(dir.path());
    assert_eq!(files.len(), 1);
    assert!(fs::read_to_string(&files[0]).unwrap().contains(text));
}

#[test]
fn test_warnings_only_failure_writes_full_report() {
    let dir = project();
    let warning = "main.cpp:4:11: warning: unused variable 'p' [-Wunused-variable]";
    let cc = fake_compiler(dir.path(), "fake-g++", &format!("{warning}\n"), 1);
    let out = quietcc(dir.path(), &[cc.to_str().unwrap(), "-c", "main.cpp"], &[]);

    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8(out.stderr).unwrap();
    assert!(stderr.contains("Compilation failed (exit code 1)."));
    assert!(stderr.contains("  Errors Found: 0\n"));
    assert!(!stderr.contains("Error 1:"));

    let files = reports(dir.path());
    assert_eq!(files.len(), 1);
    let report = fs::read_to_string(&files[0]).unwrap();
    assert!(report.lines().any(|l| l == warning));
}

#[test]
fn test_reruns_with_reordered_flags_overwrite_one_report() {
    let dir = project();
    let cc = fake_compiler(dir.path(), "fake-g++", TEMPLATE_FAILURE, 1);
    let cc = cc.to_str().unwrap();

    quietcc(dir.path(), &[cc, "-O0", "-c", "main.cpp"], &[]);
    let first = reports(dir.path());
    quietcc(dir.path(), &[cc, "-c", "main.cpp", "-O2", "-Wall"], &[]);
    let second = reports(dir.path());

    assert_eq!(first.len(), 1);
    assert_eq!(first, second);
    let report = fs::read_to_string(&second[0]).unwrap();
    assert!(report.contains("-O2"));
    assert!(!report.contains("-O0"));
}

#[test]
fn test_werror_escalates_warnings_on_success() {
    let dir = project();
    let cc = fake_compiler(
        dir.path(),
        "fake-g++",
        "main.cpp:4:11: warning: unused variable 'p' [-Wunused-variable]\n",
        0,
    );
    let out = quietcc(dir.path(), &[cc.to_str().unwrap(), "-Werror", "-c", "main.cpp"], &[]);

    assert_eq!(out.status.code(), Some(0));
    let stderr = String::from_utf8(out.stderr).unwrap();
    assert!(stderr.contains("Compilation produced 1 escalated diagnostic(s) (exit code 0)."));
    assert!(stderr.contains("  Error 1: main.cpp:4\n"));
    assert_eq!(reports(dir.path()).len(), 1);
}

#[test]
fn test_leading_flag_uses_default_compiler() {
    let dir = project();
    let cc = fake_compiler(dir.path(), "fake-g++", TEMPLATE_FAILURE, 2);
    let out = quietcc(
        dir.path(),
        &["-c", "main.cpp"],
        &[("QUIETCC_DEFAULT_COMPILER", cc.to_str().unwrap())],
    );

    assert_eq!(out.status.code(), Some(2));
    let stderr = String::from_utf8(out.stderr).unwrap();
    assert!(stderr.contains("Compilation failed (exit code 2)."));
}

#[test]
fn test_missing_compiler_exits_127() {
    let dir = project();
    let out = quietcc(dir.path(), &["quietcc-definitely-missing-cc", "-c", "main.cpp"], &[]);

    assert_eq!(out.status.code(), Some(127));
    let stderr = String::from_utf8(out.stderr).unwrap();
    assert!(stderr.contains("not found"));
    assert!(reports(dir.path()).is_empty());
}

#[test]
fn test_unwritable_report_dir_dumps_report_to_console() {
    let dir = project();
    fs::write(dir.path().join("blocker"), "file, not a directory").unwrap();
    let cc = fake_compiler(dir.path(), "fake-g++", TEMPLATE_FAILURE, 1);
    let out = quietcc(
        dir.path(),
        &[cc.to_str().unwrap(), "-c", "main.cpp"],
        &[("QUIETCC_REPORT_DIR", "blocker/reports")],
    );

    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8(out.stderr).unwrap();
    assert!(stderr.contains("  Attempted Report: "));
    assert!(stderr.contains("ERROR WRITING REPORT FILE:"));
    assert!(stderr.contains("Command:\n"));
    assert!(stderr.contains("// Source code from main.cpp"));
}
