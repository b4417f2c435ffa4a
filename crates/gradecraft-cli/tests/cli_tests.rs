//! CLI integration tests using assert_cmd.
//!
//! Each test runs in its own temp directory; the sample files created by
//! `init` keep AI grading disabled, so the whole pipeline runs offline.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn gradecraft(dir: &TempDir) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("gradecraft").unwrap();
    cmd.current_dir(dir.path());
    cmd
}

fn init(dir: &TempDir) {
    gradecraft(dir).arg("init").assert().success();
}

#[test]
fn init_creates_starter_files() {
    let dir = TempDir::new().unwrap();
    gradecraft(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created gradecraft.toml"))
        .stdout(predicate::str::contains("Created sample-exam.toml"))
        .stdout(predicate::str::contains("Created sample-submissions.toml"));

    assert!(dir.path().join("sample-exam.toml").exists());
}

#[test]
fn init_is_idempotent() {
    let dir = TempDir::new().unwrap();
    init(&dir);
    gradecraft(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Skipping gradecraft.toml"));
}

#[test]
fn validate_sample_exam() {
    let dir = TempDir::new().unwrap();
    init(&dir);

    gradecraft(&dir)
        .arg("validate")
        .arg("--exam")
        .arg("sample-exam.toml")
        .assert()
        .success()
        .stdout(predicate::str::contains("Sample Exam"))
        .stdout(predicate::str::contains("5 questions"))
        .stdout(predicate::str::contains("All exam files valid"));
}

#[test]
fn validate_nonexistent_file_fails() {
    let dir = TempDir::new().unwrap();
    gradecraft(&dir)
        .arg("validate")
        .arg("--exam")
        .arg("missing.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read exam file"));
}

#[test]
fn validate_reports_warnings() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("bad.toml"),
        r#"
[exam]
id = "bad"
title = "Bad Exam"

[[questions]]
id = "q1"
text = "Zero points"
kind = "true_false"
points = 0.0
answer = "true"
"#,
    )
    .unwrap();

    gradecraft(&dir)
        .arg("validate")
        .arg("--exam")
        .arg("bad.toml")
        .assert()
        .success()
        .stdout(predicate::str::contains("WARNING"))
        .stdout(predicate::str::contains("warning(s) found"));
}

#[test]
fn grade_writes_results_json() {
    let dir = TempDir::new().unwrap();
    init(&dir);

    gradecraft(&dir)
        .arg("grade")
        .arg("--exam")
        .arg("sample-exam.toml")
        .arg("--submissions")
        .arg("sample-submissions.toml")
        .assert()
        .success()
        .stdout(predicate::str::contains("Ada Lovelace"))
        .stdout(predicate::str::contains("Results written to"));

    assert!(dir
        .path()
        .join("gradecraft-results")
        .join("sample-exam_results.json")
        .exists());
}

#[test]
fn grade_with_csv_format_writes_csvs() {
    let dir = TempDir::new().unwrap();
    init(&dir);

    gradecraft(&dir)
        .arg("grade")
        .arg("--exam")
        .arg("sample-exam.toml")
        .arg("--submissions")
        .arg("sample-submissions.toml")
        .arg("--format")
        .arg("csv")
        .assert()
        .success();

    let results_dir = dir.path().join("gradecraft-results");
    assert!(results_dir.join("sample-exam_summary.csv").exists());
    assert!(results_dir.join("sample-exam_detailed.csv").exists());
}

#[test]
fn grade_rejects_unknown_format() {
    let dir = TempDir::new().unwrap();
    init(&dir);

    gradecraft(&dir)
        .arg("grade")
        .arg("--exam")
        .arg("sample-exam.toml")
        .arg("--submissions")
        .arg("sample-submissions.toml")
        .arg("--format")
        .arg("xml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown format"));
}

#[test]
fn grade_then_analyze_pipeline() {
    let dir = TempDir::new().unwrap();
    init(&dir);

    gradecraft(&dir)
        .arg("grade")
        .arg("--exam")
        .arg("sample-exam.toml")
        .arg("--submissions")
        .arg("sample-submissions.toml")
        .assert()
        .success();

    gradecraft(&dir)
        .arg("analyze")
        .arg("--exam")
        .arg("sample-exam.toml")
        .arg("--results")
        .arg("gradecraft-results/sample-exam_results.json")
        .assert()
        .success()
        .stdout(predicate::str::contains("Class statistics"))
        .stdout(predicate::str::contains("Grade distribution"))
        .stdout(predicate::str::contains("Top performers"));
}

#[test]
fn analyze_json_format_writes_report() {
    let dir = TempDir::new().unwrap();
    init(&dir);

    gradecraft(&dir)
        .arg("grade")
        .arg("--exam")
        .arg("sample-exam.toml")
        .arg("--submissions")
        .arg("sample-submissions.toml")
        .assert()
        .success();

    gradecraft(&dir)
        .arg("analyze")
        .arg("--exam")
        .arg("sample-exam.toml")
        .arg("--results")
        .arg("gradecraft-results/sample-exam_results.json")
        .arg("--format")
        .arg("json")
        .arg("--output")
        .arg("report.json")
        .assert()
        .success();

    let report = std::fs::read_to_string(dir.path().join("report.json")).unwrap();
    assert!(report.contains("\"exam_id\": \"sample-exam\""));
}

#[test]
fn analyze_empty_results_fails() {
    let dir = TempDir::new().unwrap();
    init(&dir);
    std::fs::write(dir.path().join("empty.json"), "[]").unwrap();

    gradecraft(&dir)
        .arg("analyze")
        .arg("--exam")
        .arg("sample-exam.toml")
        .arg("--results")
        .arg("empty.json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no submission results"));
}
