//! CLI integration tests using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const SAMPLE_EXAM: &str = "../../exams/sample.json";
const SAMPLE_SCRIPT: &str = "../../exams/sample-script.jsonl";

fn examkit() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("examkit").unwrap()
}

#[test]
fn validate_sample_exam() {
    examkit()
        .arg("validate")
        .arg("--exam")
        .arg(SAMPLE_EXAM)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exam: sample (3 sections"))
        .stdout(predicate::str::contains("All exams valid"));
}

#[test]
fn validate_reports_malformed_questions() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(
        &path,
        r#"{"id": "broken", "sections": [{"id": "R", "type": "reading", "questions": [
            {"id": "t", "number": 1, "type": "simple_table", "metadata": {"table": {"rows": []}}},
            {"id": "f", "number": 2, "type": "fill_blank", "metadata": {"template": "{{40}}"}}
        ]}]}"#,
    )
    .unwrap();

    examkit()
        .arg("validate")
        .arg("--exam")
        .arg(dir.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("error: [R/t] table has no rows"))
        .stdout(predicate::str::contains("template references missing question 40"))
        .stderr(predicate::str::contains("malformed question"));
}

#[test]
fn validate_nonexistent_file() {
    examkit()
        .arg("validate")
        .arg("--exam")
        .arg("nonexistent.json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn inspect_lists_sections_and_parts() {
    examkit()
        .arg("inspect")
        .arg("--exam")
        .arg(SAMPLE_EXAM)
        .assert()
        .success()
        .stdout(predicate::str::contains("Sample Practice Test"))
        .stdout(predicate::str::contains("40:00"))
        .stdout(predicate::str::contains("Section listening [listening]"))
        .stdout(predicate::str::contains("parts [1]"))
        .stdout(predicate::str::contains("choose 2 of 4"))
        .stdout(predicate::str::contains("3 tokens, 2 slots"));
}

#[test]
fn segment_passage_from_stdin() {
    examkit()
        .arg("segment")
        .arg("--passage")
        .arg("-")
        .write_stdin("[[p1]] First paragraph.\n\n[[p2]] Second paragraph.")
        .assert()
        .success()
        .stdout(predicate::str::contains("[1] First paragraph."))
        .stdout(predicate::str::contains("[2] Second paragraph."))
        .stdout(predicate::str::contains("2 paragraph(s)"));
}

#[test]
fn encode_answer_file() {
    let dir = TempDir::new().unwrap();
    let answers = dir.path().join("answers.json");
    std::fs::write(
        &answers,
        r#"{"l1": "Harper", "l5": ["A", "C"], "l7_0_2": "12", "l7_1_1": "Boat trip"}"#,
    )
    .unwrap();

    let output = examkit()
        .arg("encode")
        .arg("--exam")
        .arg(SAMPLE_EXAM)
        .arg("--answers")
        .arg(&answers)
        .output()
        .unwrap();
    assert!(output.status.success());

    let payload: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let answers = payload["answers"].as_array().unwrap();
    assert_eq!(answers.len(), 3);
    assert_eq!(answers[0]["questionId"], "l1");
    assert_eq!(answers[1]["studentAnswer"], serde_json::json!(["A", "C"]));
    assert_eq!(answers[2]["questionId"], "l7");
    assert_eq!(answers[2]["studentAnswer"]["cells"]["0_2"], "12");
}

#[test]
fn take_scripted_session_offline() {
    let home = TempDir::new().unwrap();

    examkit()
        .current_dir(home.path())
        .env("HOME", home.path())
        .env_remove("EXAMKIT_BASE_URL")
        .env_remove("EXAMKIT_TOKEN")
        .env_remove("RUST_LOG")
        .arg("take")
        .arg("/exams/sample")
        .arg("--offline")
        .arg(std::fs::canonicalize(SAMPLE_EXAM).unwrap())
        .arg("--script")
        .arg(std::fs::canonicalize(SAMPLE_SCRIPT).unwrap())
        .assert()
        .success()
        .stdout(predicate::str::contains("Submitted session"))
        .stdout(predicate::str::contains("Results: /results/"))
        .stdout(predicate::str::contains("listening"))
        .stderr(predicate::str::contains("loaded event script"));

    let prefs = home.path().join(".config/examkit/preferences.json");
    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(prefs).unwrap()).unwrap();
    assert_eq!(saved["fontSize"], 18);
}

#[test]
fn take_without_submit_is_abandoned() {
    let home = TempDir::new().unwrap();
    let script = home.path().join("script.jsonl");
    std::fs::write(&script, "{\"event\": \"next\"}\n").unwrap();

    examkit()
        .current_dir(home.path())
        .env("HOME", home.path())
        .arg("take")
        .arg("sample")
        .arg("--offline")
        .arg(std::fs::canonicalize(SAMPLE_EXAM).unwrap())
        .arg("--script")
        .arg(&script)
        .assert()
        .success()
        .stdout(predicate::str::contains("abandoned without submitting"));
}

#[test]
fn take_unknown_exam_fails() {
    let home = TempDir::new().unwrap();
    let script = home.path().join("script.jsonl");
    std::fs::write(&script, "").unwrap();

    examkit()
        .current_dir(home.path())
        .env("HOME", home.path())
        .arg("take")
        .arg("/exams/missing?section=reading")
        .arg("--offline")
        .arg(std::fs::canonicalize(SAMPLE_EXAM).unwrap())
        .arg("--script")
        .arg(&script)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Exam not found"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    examkit()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created examkit.toml"))
        .stdout(predicate::str::contains("Created exams/sample.json"));

    assert!(dir.path().join("examkit.toml").exists());
    assert!(dir.path().join("exams/sample.json").exists());
    assert!(dir.path().join("exams/sample-script.jsonl").exists());
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    examkit()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();

    examkit()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn help_output() {
    examkit()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Exam-taking session engine"));
}

#[test]
fn version_output() {
    examkit()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("examkit"));
}
