//! Exercises the `ledgerlite` binary end-to-end against a scripted
//! `--file` run, asserting on stdout. No ledger-core logic is tested
//! directly here — only that the CLI wires argument parsing, the engine,
//! and output rendering together correctly.

use std::path::PathBuf;
use std::process::Command;

use tempfile::tempdir;

fn bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_ledgerlite"))
}

#[test]
fn runs_a_script_file_and_prints_each_result() {
    let dir = tempdir().unwrap();
    let ledger_path = dir.path().join("ledger.jsonl");
    let script_path = dir.path().join("script.sql");
    std::fs::write(
        &script_path,
        "CREATE TABLE users (id INT PRIMARY KEY, name TEXT);\n\
         INSERT INTO users VALUES (1, 'Alice');\n\
         SELECT * FROM users;\n",
    )
    .unwrap();

    let output = Command::new(bin())
        .arg("--ledger")
        .arg(&ledger_path)
        .arg("--file")
        .arg(&script_path)
        .output()
        .expect("failed to run ledgerlite");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("table 'users' created"));
    assert!(stdout.contains("1 row inserted"));
    assert!(stdout.contains("Alice"));
    assert!(ledger_path.exists());
}

#[test]
fn script_stops_at_first_error() {
    let dir = tempdir().unwrap();
    let ledger_path = dir.path().join("ledger.jsonl");
    let script_path = dir.path().join("script.sql");
    std::fs::write(
        &script_path,
        "CREATE TABLE t (id INT PRIMARY KEY);\n\
         INSERT INTO t VALUES (1);\n\
         INSERT INTO t VALUES (1);\n\
         INSERT INTO t VALUES (2);\n",
    )
    .unwrap();

    let output = Command::new(bin())
        .arg("--ledger")
        .arg(&ledger_path)
        .arg("--file")
        .arg(&script_path)
        .output()
        .expect("failed to run ledgerlite");

    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    // the third statement (duplicate PK) fails before the fourth ever runs
    assert!(!stdout.contains("2 row"));
}

#[test]
fn plain_output_mode_renders_pipe_delimited_rows() {
    let dir = tempdir().unwrap();
    let ledger_path = dir.path().join("ledger.jsonl");
    let script_path = dir.path().join("script.sql");
    std::fs::write(
        &script_path,
        "CREATE TABLE t (id INT PRIMARY KEY, v TEXT);\n\
         INSERT INTO t VALUES (1, 'x');\n\
         SELECT * FROM t;\n",
    )
    .unwrap();

    let output = Command::new(bin())
        .arg("--ledger")
        .arg(&ledger_path)
        .arg("--file")
        .arg(&script_path)
        .arg("--plain")
        .output()
        .expect("failed to run ledgerlite");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("id | v"));
    assert!(stdout.contains("1 | x"));
}
