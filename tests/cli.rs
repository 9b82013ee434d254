use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::NamedTempFile;

fn script(source: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(source.as_bytes()).expect("write temp file");
    file
}

fn rox() -> Command {
    Command::cargo_bin("rox").expect("binary builds")
}

#[test]
fn run_prints_program_output() {
    let file = script("var greeting = \"hello\";\nprint greeting + \" world\";\nprint 6 * 7;");

    rox()
        .arg("run")
        .arg(file.path())
        .assert()
        .success()
        .stdout("hello world\n42\n");
}

#[test]
fn run_exits_65_on_static_error() {
    let file = script("print 1;\nprint ;");

    rox()
        .arg("run")
        .arg(file.path())
        .assert()
        .code(65)
        .stdout("")
        .stderr(predicate::str::contains(
            "[line 2] Error at ';': Expected expression.",
        ));
}

#[test]
fn run_exits_65_on_resolution_error() {
    let file = script("return 1;");

    rox()
        .arg("run")
        .arg(file.path())
        .assert()
        .code(65)
        .stderr(predicate::str::contains("Can't return from top-level code."));
}

#[test]
fn run_exits_70_on_runtime_error() {
    let file = script("print \"start\";\nprint -true;");

    rox()
        .arg("run")
        .arg(file.path())
        .assert()
        .code(70)
        .stdout("start\n")
        .stderr(predicate::str::contains(
            "Operand of '-' must be a number; got boolean.\n[line 2]",
        ));
}

#[test]
fn tokenize_prints_one_token_per_line() {
    let file = script("var x = 1.5;");

    rox()
        .arg("tokenize")
        .arg(file.path())
        .assert()
        .success()
        .stdout("VAR var null\nIDENTIFIER x null\nEQUAL = null\nNUMBER 1.5 1.5\nSEMICOLON ; null\nEOF  null\n");
}

#[test]
fn tokenize_reports_bad_characters_and_keeps_going() {
    let file = script("(@)");

    rox()
        .arg("tokenize")
        .arg(file.path())
        .assert()
        .code(65)
        .stdout("LEFT_PAREN ( null\nRIGHT_PAREN ) null\nEOF  null\n")
        .stderr(predicate::str::contains(
            "[line 1] Error: Unexpected character: @",
        ));
}

#[test]
fn tokenize_json_emits_an_array() {
    let file = script("print 1;");

    let output = rox()
        .arg("tokenize")
        .arg("--json")
        .arg(file.path())
        .output()
        .expect("run rox");

    assert!(output.status.success());

    let tokens: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is JSON");
    let tokens = tokens.as_array().expect("a JSON array");

    assert_eq!(tokens.len(), 4);
    assert_eq!(tokens[0]["lexeme"], "print");
    assert_eq!(tokens[0]["line"], 1);
}

#[test]
fn parse_prints_syntax_tree() {
    let file = script("print 1 + 2;");

    rox()
        .arg("parse")
        .arg(file.path())
        .assert()
        .success()
        .stdout("(print (+ 1.0 2.0))\n");
}

#[test]
fn missing_file_fails() {
    rox()
        .arg("run")
        .arg("definitely/not/here.lox")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to open file"));
}

#[test]
fn repl_keeps_state_between_lines() {
    rox()
        .arg("repl")
        .write_stdin("var a = 2;\nprint a * 3;\nprint nope;\nprint a;\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("6\n"))
        .stdout(predicate::str::contains("2\n"))
        .stderr(predicate::str::contains("Undefined variable 'nope'."));
}

#[test]
fn run_rejects_non_utf8_source() {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(&[b'p', 0xff, 0xfe]).expect("write temp file");

    rox()
        .arg("run")
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not valid UTF-8"));
}

#[test]
fn log_flag_writes_log_file() {
    let file = script("print 1;");
    let log_dir = tempfile::tempdir().expect("create temp dir");
    let log_path = log_dir.path().join("rox.log");

    rox()
        .env_remove("RUST_LOG")
        .arg("--log")
        .arg("--log-file")
        .arg(&log_path)
        .arg("run")
        .arg(file.path())
        .assert()
        .success()
        .stdout("1\n");

    let log = std::fs::read_to_string(&log_path).expect("log file exists");
    assert!(log.contains("Reading file"), "log was: {}", log);
}

#[test]
fn runs_quietly_without_log_flag() {
    let file = script("print 1;");

    rox()
        .arg("run")
        .arg(file.path())
        .assert()
        .success()
        .stdout("1\n")
        .stderr("");
}
