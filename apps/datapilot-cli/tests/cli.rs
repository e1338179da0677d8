//! End-to-end tests for the `datapilot` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

fn datapilot() -> Command {
    let mut cmd = Command::cargo_bin("datapilot").unwrap();
    cmd.env_remove("RUST_LOG").arg("--no-color");
    cmd
}

#[test]
fn test_classify_text() {
    datapilot()
        .args(["--today", "2024-05-15", "classify", "本月销售额是多少"])
        .assert()
        .success()
        .stdout(predicate::str::contains("QUERY_SALES_OVERVIEW"))
        .stdout(predicate::str::contains("2024-05-01 ~ 2024-05-31"))
        .stdout(predicate::str::contains("Resolved by rules"));
}

#[test]
fn test_classify_json() {
    let output = datapilot()
        .args(["--format", "json", "classify", "随便说点什么"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["intent"], "UNKNOWN");
    assert_eq!(value["confidence"], 0.0);
    assert_eq!(value["needs_llm_fallback"], true);
    assert_eq!(value["match_method"], "NONE");
}

#[test]
fn test_classify_candidates_table() {
    datapilot()
        .args(["classify", "--candidates", "销售排名前5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Candidates"))
        .stdout(predicate::str::contains("QUERY_SALES_RANKING"))
        .stdout(predicate::str::contains("QUERY_SALES_OVERVIEW"));
}

#[test]
fn test_invalid_threshold_rejected() {
    datapilot()
        .args(["--threshold", "1.5", "classify", "本月销售额"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_time_command() {
    datapilot()
        .args(["--today", "2024-05-15", "time", "最近7天的订单"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2024-05-08 ~ 2024-05-15"));

    datapilot()
        .args(["time", "没有时间"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No time expression found"));
}

#[test]
fn test_catalog_yaml() {
    datapilot()
        .args(["--format", "yaml", "catalog"])
        .assert()
        .success()
        .stdout(predicate::str::contains("code: COMPARE_REGION"))
        .stdout(predicate::str::contains("UNKNOWN").not());
}

#[test]
fn test_patterns_check() {
    let mut good = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(good, r#"{{"QUERY_INVENTORY": {{"keywords": ["备货"]}}}}"#).unwrap();

    datapilot()
        .args(["patterns", "check"])
        .arg(good.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("QUERY_INVENTORY merged"));

    let mut bad = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(bad, r#"{{"QUERY_COST": {{"patterns": ["(unclosed"]}}}}"#).unwrap();

    datapilot()
        .args(["patterns", "check"])
        .arg(bad.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("QUERY_COST"))
        .stderr(predicate::str::contains("1 pattern entry rejected"));
}

#[test]
fn test_missing_pattern_file_is_fail_open() {
    datapilot()
        .args(["--patterns", "/nonexistent/patterns.json", "classify", "本月销售额是多少"])
        .assert()
        .success()
        .stdout(predicate::str::contains("QUERY_SALES_OVERVIEW"));
}

#[test]
fn test_batch_json() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "本月销售额是多少\n\n# comment\n随便说点什么").unwrap();

    let output = datapilot()
        .args(["--format", "json", "batch"])
        .arg(file.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["results"].as_array().unwrap().len(), 2);
    assert_eq!(value["statistics"]["total_requests"], 2);
    assert_eq!(value["statistics"]["fallback_count"], 1);
}
