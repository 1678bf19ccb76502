use std::{fs, path::Path};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn gopy(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("gopy").expect("binary exists");
    cmd.current_dir(dir.path())
        .arg("--log-file")
        .arg(dir.path().join("errors.log"));
    cmd
}

fn write_input(dir: &TempDir, src: &str) -> std::path::PathBuf {
    let path = dir.path().join("main.gopy");
    fs::write(&path, src).expect("write input");
    path
}

fn read_log(dir: &TempDir) -> String {
    fs::read_to_string(dir.path().join("errors.log")).unwrap_or_default()
}

#[test]
fn emits_go() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(&dir, "let x = 1\nprint(x + 2)\n");

    gopy(&dir)
        .arg(&input)
        .args(["--emit", "go"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("package main\n"))
        .stdout(predicate::str::contains("\tx := int64(1)\n"))
        .stdout(predicate::str::contains("\tfmt.Println((x + int64(2)))\n"));

    assert!(!Path::new(&dir.path().join("errors.log")).exists());
}

#[test]
fn emits_ast() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(&dir, "let x = 1\n");

    gopy(&dir)
        .arg(&input)
        .args(["--emit", "ast"])
        .assert()
        .success()
        .stdout("let x (0..9)\n  int 1 (8..9)\n");
}

#[test]
fn emits_tokens() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(&dir, "if x\n    y\n");

    gopy(&dir)
        .arg(&input)
        .args(["--emit", "tokens"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0..2\tIf\t\"if\"\n"))
        .stdout(predicate::str::contains("9..9\tIndent\t\"\"\n"))
        .stdout(predicate::str::contains("11..11\tDedent\t\"\"\n"))
        .stdout(predicate::str::ends_with("11..11\tEof\t\"\"\n"));
}

#[test]
fn reports_and_logs_parse_errors() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(&dir, "let = 1\nlet y 2\n");

    gopy(&dir)
        .arg(&input)
        .args(["--emit", "go"])
        .assert()
        .failure()
        .stdout("")
        .stderr(predicate::str::contains(
            "parse error: 1:5: expected token Identifier, but got Assign",
        ))
        .stderr(predicate::str::contains(
            "parse error: 2:7: expected token Assign, but got Int",
        ));

    let log = read_log(&dir);
    assert_eq!(log.lines().count(), 2);
    assert!(log.contains("] parse error: 1:5: expected token Identifier, but got Assign"));
}

#[test]
fn reports_and_logs_generate_errors() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(&dir, "class P x\nlet p = P(1, 2)\n");

    gopy(&dir)
        .arg(&input)
        .args(["--emit", "build"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "generate error: 2:9: class P has 1 fields, but got 2 arguments",
        ));

    assert!(read_log(&dir).contains("] generate error: 2:9:"));
}

#[test]
fn reports_missing_input() {
    let dir = tempfile::tempdir().unwrap();

    gopy(&dir)
        .arg(dir.path().join("nope.gopy"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("error: failed to read input file"));

    assert!(read_log(&dir).contains("failed to read input file"));
}

#[test]
fn reports_missing_toolchain() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(&dir, "print(1)\n");

    gopy(&dir)
        .arg(&input)
        .env("GOPY_GO", dir.path().join("no-such-go"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("error: failed to start go build"));
}

#[test]
fn rejects_unknown_emit() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(&dir, "print(1)\n");

    gopy(&dir)
        .arg(&input)
        .args(["--emit", "llvm"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value 'llvm'"));
}
