//! Integration tests for the `chapter-splitter` binary.

use assert_cmd::Command;
use predicates::prelude::*;

fn cmd() -> Command {
    Command::cargo_bin("chapter-splitter").unwrap()
}

const BOOK: &str = "Contents\n\
Chapter 1: Intro, 5\n\
Chapter 2: Setup, 9\n\
preface\n\
# Chapter 1\n\
intro text\n\
# Chapter 2\n\
setup text\n";

#[test]
fn splits_book_and_prints_summary() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("book.md");
    std::fs::write(&input, BOOK).unwrap();
    let out = dir.path().join("chapters");

    cmd()
        .arg(&input)
        .arg("--out")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Elected TOC at line 2"))
        .stdout(predicate::str::contains("01_Intro.md"))
        .stdout(predicate::str::contains("02_Setup.md"));

    assert_eq!(
        std::fs::read_to_string(out.join("02_Setup.md")).unwrap(),
        "# Chapter 2\nsetup text\n"
    );
    assert!(out.join("00_Front_Matter.md").exists());
}

#[test]
fn json_report() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("book.md");
    std::fs::write(&input, BOOK).unwrap();

    let output = cmd()
        .arg(&input)
        .arg("-o")
        .arg(dir.path().join("out"))
        .args(["--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["elected_toc_line"], 2);
    let chapters = report["chapters"].as_array().unwrap();
    assert_eq!(chapters.len(), 3);
    assert_eq!(chapters[1]["filename"], "01_Intro.md");
    assert_eq!(chapters[1]["start"], 4);
    assert_eq!(chapters[1]["end"], 6);
}

#[test]
fn no_toc_fails_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("notes.md");
    std::fs::write(&input, "plain\nnotes\n").unwrap();
    let out = dir.path().join("chapters");

    cmd()
        .arg(&input)
        .arg("-o")
        .arg(&out)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Error: no valid TOC sequence found"));
    assert!(!out.exists());
}

#[test]
fn missing_input_fails() {
    cmd()
        .arg("/nonexistent/book.md")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Error: file not found"));
}

#[test]
fn missing_argument_is_usage_error() {
    cmd().assert().code(2);
}
