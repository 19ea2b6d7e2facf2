//! # CLI Tests
//!
//! Drives the compiled binary end to end: validate and run subcommands,
//! result-document persistence, exit codes.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

const STUB_WORKFLOW: &str = r#"
workflow_name: cli_demo
steps:
  - id: first
    agent: StubAgent
    config: { returns: { items: [1, 2, 3] } }
  - id: second
    agent: StubAgent
    inputs:
      data: "{{ first.output.items }}"
    config: { returns: { results: [1] } }
"#;

fn workflow_file(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".yaml")
        .tempfile()
        .unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn validate_accepts_well_formed_workflow() {
    let file = workflow_file(STUB_WORKFLOW);

    Command::cargo_bin("leadflow")
        .unwrap()
        .arg("validate")
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("is valid"))
        .stdout(predicate::str::contains("first (StubAgent)"));
}

#[test]
fn validate_rejects_unknown_agent() {
    let file = workflow_file(
        r#"
workflow_name: bad
steps:
  - id: a
    agent: Nonexistent
"#,
    );

    Command::cargo_bin("leadflow")
        .unwrap()
        .arg("validate")
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("LF-010"))
        .stderr(predicate::str::contains("Fix:"));
}

#[test]
fn validate_rejects_malformed_template() {
    let file = workflow_file(
        r#"
workflow_name: bad
steps:
  - id: a
    agent: StubAgent
    inputs:
      broken: "{{ a.output.x"
"#,
    );

    Command::cargo_bin("leadflow")
        .unwrap()
        .arg("validate")
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("LF-020"));
}

#[test]
fn run_writes_result_document() {
    let file = workflow_file(STUB_WORKFLOW);
    let out = tempfile::Builder::new()
        .suffix(".json")
        .tempfile()
        .unwrap();

    Command::cargo_bin("leadflow")
        .unwrap()
        .arg("run")
        .arg(file.path())
        .arg("--out")
        .arg(out.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("completed"));

    let document: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out.path()).unwrap()).unwrap();
    assert_eq!(document["workflow_name"], "cli_demo");
    assert_eq!(document["status"], "completed");
    assert_eq!(document["steps"].as_array().unwrap().len(), 2);
    assert_eq!(document["final_state"]["items_count"], 3);
}

#[test]
fn failed_validation_still_produces_result_document() {
    let file = workflow_file(
        r#"
workflow_name: bad_agent
steps:
  - id: a
    agent: Nonexistent
"#,
    );
    let out = tempfile::Builder::new()
        .suffix(".json")
        .tempfile()
        .unwrap();

    Command::cargo_bin("leadflow")
        .unwrap()
        .arg("run")
        .arg(file.path())
        .arg("--out")
        .arg(out.path())
        .assert()
        .failure();

    let document: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out.path()).unwrap()).unwrap();
    assert_eq!(document["status"], "failed");
    assert!(document["error"].as_str().unwrap().contains("LF-010"));
    assert_eq!(document["steps"].as_array().unwrap().len(), 0);
}

#[test]
fn policy_override_flips_status() {
    let file = workflow_file(
        r#"
workflow_name: partial
steps:
  - id: broken
    agent: StubAgent
    config: { fail: "boom" }
  - id: fine
    agent: StubAgent
"#,
    );
    let out = tempfile::Builder::new()
        .suffix(".json")
        .tempfile()
        .unwrap();

    // best_effort (default): exit success
    Command::cargo_bin("leadflow")
        .unwrap()
        .arg("run")
        .arg(file.path())
        .arg("--out")
        .arg(out.path())
        .assert()
        .success();

    // all-steps: same workflow now exits nonzero
    Command::cargo_bin("leadflow")
        .unwrap()
        .arg("run")
        .arg(file.path())
        .arg("--policy")
        .arg("all-steps")
        .arg("--out")
        .arg(out.path())
        .assert()
        .failure();
}

#[test]
fn run_accepts_json_documents() {
    let mut file = tempfile::Builder::new()
        .suffix(".json")
        .tempfile()
        .unwrap();
    file.write_all(
        br#"{"workflow_name": "json_demo", "steps": [{"id": "a", "agent": "StubAgent"}]}"#,
    )
    .unwrap();
    let out = tempfile::Builder::new()
        .suffix(".json")
        .tempfile()
        .unwrap();

    Command::cargo_bin("leadflow")
        .unwrap()
        .arg("run")
        .arg(file.path())
        .arg("--out")
        .arg(out.path())
        .assert()
        .success();
}

#[test]
fn missing_file_reports_io_error() {
    Command::cargo_bin("leadflow")
        .unwrap()
        .arg("run")
        .arg("does_not_exist.yaml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("IO error"));
}
