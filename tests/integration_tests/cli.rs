//! Integration tests for the e2e-trace binary.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use crate::common::TraceFiles;

fn run(files: &TraceFiles, args: &[&str], traces: &[PathBuf]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_e2e-trace"))
        .env("E2ETRACE_CONFIG_PATH", files.no_config())
        .env_remove("RUST_LOG")
        .args(args)
        .args(traces)
        .output()
        .expect("Failed to run e2e-trace")
}

fn stdout(output: &Output) -> String {
    assert!(
        output.status.success(),
        "e2e-trace failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_tree() {
    let files = TraceFiles::new();
    let (client, server) = files.client_server();
    let output = run(&files, &["tree"], &[client, server]);
    insta::assert_snapshot!(stdout(&output), @r"
    ACTIVITY TREE
    -------------
    Process action 'Echo' [message] 3 records, 1000ms
      Open connection [connection] 3 records, 800ms
    Listen at 'http://server01/svc' [listen] 4 records, 300ms
      Execute user code [user-code-execution] 2 records, 100ms
    ");
}

#[test]
fn test_columns() {
    let files = TraceFiles::new();
    let (client, server) = files.client_server();
    let output = run(&files, &["columns"], &[server, client]);
    insta::assert_snapshot!(stdout(&output), @r"
    EXECUTION COLUMNS
    -----------------
    [0] client01/app.exe:100
      0  Process action 'Echo'  3 cells
      1  Open connection  4 cells, parent at 0
    [1] server01/svc.exe:200
      0  Listen at 'http://server01/svc'  4 cells
      1  Execute user code  3 cells, parent at 0

    9 rows
    ");
}

#[test]
fn test_columns_in_thread_mode() {
    let files = TraceFiles::new();
    let (client, server) = files.client_server();
    let output = run(&files, &["--thread-mode", "columns"], &[client, server]);
    let text = stdout(&output);
    assert!(text.contains("[0] client01/app.exe:100#1"), "{text}");
    assert!(text.contains("[1] client01/app.exe:100#2"), "{text}");
    assert!(text.contains("[2] server01/svc.exe:200#9"), "{text}");
}

#[test]
fn test_exchanges() {
    let files = TraceFiles::new();
    let (client, server) = files.client_server();
    let output = run(&files, &["exchanges"], &[client, server]);
    insta::assert_snapshot!(stdout(&output), @r"
    MESSAGE EXCHANGES
    -----------------
    urn:uuid:1  #3 client01/app.exe:100 -> #5 server01/svc.exe:200  (0 related)

    UNMATCHED SENT
    --------------
      (none)

    UNMATCHED RECEIVED
    ------------------
      (none)
    ");
}

#[test]
fn test_config_file_enables_thread_mode() {
    let files = TraceFiles::new();
    let (client, _) = files.client_server();
    let config = files.write_raw("config.toml", "thread-mode = true\n");
    let output = run(
        &files,
        &["--config", path_str(&config), "columns"],
        &[client],
    );
    assert!(stdout(&output).contains("client01/app.exe:100#2"));
}

#[test]
fn test_missing_trace_file_fails() {
    let files = TraceFiles::new();
    let output = run(&files, &["tree"], &[files.dir().join("missing.jsonl")]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid trace file"), "{stderr}");
}

#[test]
fn test_invalid_config_fails() {
    let files = TraceFiles::new();
    let (client, _) = files.client_server();
    let config = files.write_raw("config.toml", "thread-mode = \"yes\"\n");
    let output = run(
        &files,
        &["--config", path_str(&config), "tree"],
        &[client],
    );
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to load configuration"), "{stderr}");
}

#[test]
fn test_files_are_required() {
    let files = TraceFiles::new();
    let output = run(&files, &["tree"], &[]);
    assert!(!output.status.success());
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}
