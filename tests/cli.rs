use assert_cmd::prelude::*;
use predicates::str::contains;
use std::process::Command;

const DELIMITER: &str = "---------------------------------------------";

#[test]
fn no_args_runs_default_integration() {
    let output = Command::cargo_bin("segint").unwrap().output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();

    assert_eq!(stdout.matches(DELIMITER).count(), 4);
    assert_eq!(stdout.matches("Main thread").count(), 1);
    assert_eq!(stdout.matches("Pool thread").count(), 3);
    assert!(stdout.contains("Processed range: [-25, -17.5]"));
    assert!(stdout.contains("Processed range: [-2.5, 5]"));
    assert!(stdout.contains("Final result:"));
    assert!(stdout.contains("total elapsed:"));
}

#[test]
fn custom_interval_from_flags() {
    // one step per segment: f(0) + f(1) + f(2) + f(3) = 1 + 1 + 19 + 169
    Command::cargo_bin("segint")
        .unwrap()
        .args(&["-a", "0", "-b", "4", "-n", "4", "-s", "4", "-t", "1"])
        .assert()
        .success()
        .stdout(contains("Processed range: [3, 4]"))
        .stdout(contains("integral = 190.000000"))
        .stdout(contains("max = 169.000000"));
}

#[test]
fn every_pool_kind_runs() {
    for pool in &["shared", "naive", "rayon"] {
        Command::cargo_bin("segint")
            .unwrap()
            .args(&["--pool", pool, "--threads", "2", "--segments", "8"])
            .assert()
            .success()
            .stdout(contains("Final result:"));
    }
}

#[test]
fn json_output() {
    let output = Command::cargo_bin("segint")
        .unwrap()
        .args(&["--json", "--segments", "3", "--steps", "30"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["run"]["segments"], 3);
    assert_eq!(value["segments"].as_array().unwrap().len(), 3);
    assert_eq!(value["run"]["config"]["total_steps"], 30);
}

#[test]
fn strict_remainder_fails() {
    Command::cargo_bin("segint")
        .unwrap()
        .args(&["--steps", "10", "--remainder", "strict"])
        .assert()
        .failure()
        .stderr(contains("do not divide evenly"));
}

#[test]
fn pool_names_ignore_case() {
    Command::cargo_bin("segint")
        .unwrap()
        .args(&["--pool", "Rayon", "--threads", "2"])
        .assert()
        .success()
        .stdout(contains("Final result:"));
}

#[test]
fn unknown_pool_is_rejected() {
    Command::cargo_bin("segint")
        .unwrap()
        .args(&["--pool", "fancy"])
        .assert()
        .failure();
}
