//! CLI subprocess tests.
//!
//! Each test runs `lvr` in an isolated temp directory with no config file.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{Value, json};
use std::path::Path;
use tempfile::TempDir;

fn lvr_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("lvr"));
    cmd.current_dir(dir);
    cmd.env("LVR_LOG", "error");
    cmd.env_remove("LVR_CONFIG");
    cmd.env_remove("RUST_BACKTRACE");
    cmd.env_remove("RUST_LIB_BACKTRACE");
    cmd.env("LVR_DB_PATH", dir.join("lvr.sqlite3"));
    cmd
}

fn payload() -> Value {
    let months: Vec<Value> = (1..=12)
        .map(|m| json!({ "month": format!("M{m}"), "low": 1000, "high": 2000 }))
        .collect();
    json!({
        "meta": {
            "leadId": "00Q5f000001",
            "homeownerFirstName": "Dana",
            "homeownerFullName": "Dana Whitfield"
        },
        "address": "77 Dune Allen Rd, Santa Rosa Beach, FL 32459",
        "bedrooms": 3,
        "bathrooms": 2,
        "city": "Santa Rosa Beach",
        "state": "FL",
        "expectedAnnualRevenue": 90000,
        "lowAnnualRevenue": 70000,
        "highAnnualRevenue": 110000,
        "monthlyRevenue": months,
        "cta": {
            "aeName": "Kaci Wolkers",
            "aeTitle": "Account Executive",
            "aePhone": "(850) 641-1001",
            "aeEmail": "kaci.wolkers@golocalvr.com"
        }
    })
}

fn write_payload(dir: &Path, value: &Value) -> std::path::PathBuf {
    let path = dir.join("payload.json");
    std::fs::write(&path, value.to_string()).expect("write payload");
    path
}

#[test]
fn normalize_prints_canonical_json() {
    let dir = TempDir::new().expect("tempdir");
    let file = write_payload(dir.path(), &payload());

    let output = lvr_cmd(dir.path())
        .args(["normalize", "--json"])
        .arg(&file)
        .output()
        .expect("normalize should not crash");
    assert!(
        output.status.success(),
        "normalize failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let json: Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(json["ownerSlug"], "kaci-wolkers");
    assert_eq!(
        json["record"]["meta"]["slug"],
        "77-dune-allen-rd-santa-rosa-beach-fl-32459"
    );
    assert_eq!(json["record"]["projections"]["expectedRevenue"], 90000.0);
    assert_eq!(json["record"]["property"]["market"], "30A - Florida");
}

#[test]
fn normalize_human_output_summarises_record() {
    let dir = TempDir::new().expect("tempdir");
    let file = write_payload(dir.path(), &payload());

    lvr_cmd(dir.path())
        .arg("normalize")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Projection 77-dune-allen-rd-santa-rosa-beach-fl-32459",
        ))
        .stdout(predicate::str::contains("kaci-wolkers"));
}

#[test]
fn normalize_reports_every_failed_field() {
    let dir = TempDir::new().expect("tempdir");
    let mut bad = payload();
    bad.as_object_mut().expect("object").remove("address");
    bad["cta"].as_object_mut().expect("object").remove("aeEmail");
    let file = write_payload(dir.path(), &bad);

    let output = lvr_cmd(dir.path())
        .args(["normalize", "--json"])
        .arg(&file)
        .output()
        .expect("normalize should not crash");
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    let start = stderr.find('{').expect("json error on stderr");
    let end = stderr.rfind('}').expect("json error on stderr");
    let json: Value = serde_json::from_str(&stderr[start..=end]).expect("valid JSON error");
    assert_eq!(json["error"]["error_code"], "E2002");
    let details = json["error"]["details"].to_string();
    assert!(details.contains("property.address"), "{details}");
    assert!(details.contains("cta.aeEmail"), "{details}");
}

#[test]
fn normalize_rejects_non_json_input() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("payload.json");
    std::fs::write(&path, "not json").expect("write");

    lvr_cmd(dir.path())
        .arg("normalize")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("not valid JSON"));
}

#[test]
fn runs_on_fresh_database_is_empty() {
    let dir = TempDir::new().expect("tempdir");

    let output = lvr_cmd(dir.path())
        .args(["runs", "--json"])
        .output()
        .expect("runs should not crash");
    assert!(
        output.status.success(),
        "runs failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let json: Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(json, json!([]));

    lvr_cmd(dir.path())
        .arg("runs")
        .assert()
        .success()
        .stdout(predicate::str::contains("no projection runs recorded"));
}

#[test]
fn malformed_config_file_fails_with_parse_code() {
    let dir = TempDir::new().expect("tempdir");
    std::fs::write(dir.path().join("lvr.toml"), "[server\nbind = 1").expect("write config");

    lvr_cmd(dir.path())
        .arg("runs")
        .assert()
        .failure()
        .stderr(predicate::str::contains("E1002"));
}

#[test]
fn missing_explicit_config_is_an_error() {
    let dir = TempDir::new().expect("tempdir");
    lvr_cmd(dir.path())
        .args(["--config", "nope.toml", "runs"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}
