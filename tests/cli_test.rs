//! End-to-end tests for the `ioslab-tutor` CLI harness (SPEC_FULL §2 item 10).
//!
//! These exercise the binary the way a learner would from a terminal:
//! `validate-patterns` against the repo's own `data/patterns` corpus, and
//! `status` against a config pointed at a scratch directory.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn validate_patterns_accepts_repo_corpus() {
    let mut cmd = Command::cargo_bin("ioslab-tutor").expect("binary should build");
    cmd.args(["validate-patterns", "--patterns-dir", "data/patterns"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("pattern file(s)"));
}

#[test]
fn validate_patterns_rejects_missing_directory() {
    let mut cmd = Command::cargo_bin("ioslab-tutor").expect("binary should build");
    cmd.args(["validate-patterns", "--patterns-dir", "data/does-not-exist"]);
    cmd.assert().failure();
}

#[test]
fn status_reports_json_shape() {
    let temp = tempfile::tempdir().expect("tempdir");
    let mut cmd = Command::cargo_bin("ioslab-tutor").expect("binary should build");
    cmd.env("ILT_LLM__MODE", "self_hosted")
        .env("ILT_PATHS__LABS_DIR", temp.path())
        .env("ILT_RETRIEVER__INDEX_PATH", temp.path().join("index.db"))
        .args(["--format", "json", "status"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"llm_mode\""));
}
