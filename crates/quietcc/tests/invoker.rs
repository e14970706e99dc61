#![cfg(unix)]

use quietcc::invoker::invoke;
use quietcc::{InvokeError, Invocation};

fn sh(script: &str) -> Invocation {
    Invocation {
        program: "sh".into(),
        args: vec!["-c".into(), script.into()],
    }
}

#[tokio::test]
async fn test_captures_both_streams_and_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    let result = invoke(&sh("echo one; echo two >&2; echo three; exit 4"), dir.path())
        .await
        .unwrap();

    assert_eq!(result.exit_code, 4);
    assert!(!result.succeeded());
    assert_eq!(result.stdout, "one\nthree\n");
    assert_eq!(result.stderr, "two\n");

    // Cross-stream order is best effort; each stream's own order is not.
    let merged: Vec<&str> = result.raw_output.lines().collect();
    assert_eq!(merged.len(), 3);
    let one = merged.iter().position(|l| *l == "one").unwrap();
    let three = merged.iter().position(|l| *l == "three").unwrap();
    assert!(one < three);
    assert!(merged.contains(&"two"));
}

#[tokio::test]
async fn test_large_output_on_both_streams_does_not_block() {
    let dir = tempfile::tempdir().unwrap();
    let script = "i=0; while [ $i -lt 20000 ]; do echo \"out $i\"; echo \"err $i\" >&2; i=$((i+1)); done";
    let result = invoke(&sh(script), dir.path()).await.unwrap();

    assert_eq!(result.exit_code, 0);
    assert_eq!(result.stdout.lines().count(), 20000);
    assert_eq!(result.stderr.lines().count(), 20000);
    assert_eq!(result.stderr.lines().last(), Some("err 19999"));
}

#[tokio::test]
async fn test_runs_in_given_directory_and_records_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("marker.txt"), "here").unwrap();
    let invocation = Invocation {
        program: "sh".into(),
        args: vec!["-c".into(), "cat marker.txt".into(), "a.cpp".into(), "a.o".into()],
    };
    let result = invoke(&invocation, dir.path()).await.unwrap();

    assert_eq!(result.stdout, "here\n");
    assert_eq!(result.files.sources, vec![dir.path().join("a.cpp")]);
    assert_eq!(result.files.binaries, vec![std::path::PathBuf::from("a.o")]);
}

#[tokio::test]
async fn test_signal_exit_maps_above_128() {
    let dir = tempfile::tempdir().unwrap();
    let result = invoke(&sh("kill -TERM $$"), dir.path()).await.unwrap();
    assert_eq!(result.exit_code, 128 + 15);
}

#[tokio::test]
async fn test_missing_program_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let invocation = Invocation {
        program: "quietcc-missing-program-for-test".into(),
        args: Vec::new(),
    };
    let err = invoke(&invocation, dir.path()).await.unwrap_err();
    assert!(matches!(err, InvokeError::NotFound { .. }));
    assert_eq!(err.exit_code(), 127);
}
