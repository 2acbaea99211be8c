use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn modguard_cmd() -> Command {
    Command::cargo_bin("modguard").unwrap()
}

const PASSING: &str = r#"
[modules."modules/testing"]
tier = 0

[modules."modules/logger"]
tier = 1
dependencies = ["modules/testing"]

[modules."modules/retry"]
tier = 2
dependencies = ["modules/logger", "modules/testing"]

[bounds."modules/retry"]
max = 2
expected = ["modules/logger", "modules/testing"]

[[bundles]]
name = "consumer"
members = ["modules/retry", "modules/logger"]
"#;

fn project(config: &str) -> TempDir {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("Modguard.toml"), config).unwrap();
    tmp
}

#[test]
fn test_verify_passing_request() {
    let tmp = project(PASSING);

    modguard_cmd()
        .current_dir(tmp.path())
        .arg("verify")
        .assert()
        .success()
        .stdout(predicate::str::contains("PASS [tier] modules/retry pulls in 2 module(s)"))
        .stdout(predicate::str::contains(
            "PASS [ambiguous-import] consumer resolves without ambiguous imports",
        ))
        .stdout(predicate::str::contains("2 check(s) passed."));
}

#[test]
fn test_verify_discovers_config_in_parent() {
    let tmp = project(PASSING);
    let nested = tmp.path().join("modules").join("retry");
    fs::create_dir_all(&nested).unwrap();

    modguard_cmd()
        .current_dir(&nested)
        .arg("verify")
        .assert()
        .success();
}

#[test]
fn test_verify_failing_bound_exits_nonzero() {
    let tmp = project(&PASSING.replace("max = 2", "max = 1"));

    modguard_cmd()
        .current_dir(tmp.path())
        .arg("verify")
        .assert()
        .failure()
        .stdout(predicate::str::contains("FAIL [tier] modules/retry"))
        .stderr(predicate::str::contains("Verification failed"));
}

#[test]
fn test_verify_json_output() {
    let tmp = project(PASSING);

    modguard_cmd()
        .current_dir(tmp.path())
        .args(["verify", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"check\": \"ambiguous-import\""))
        .stdout(predicate::str::contains("\"status\": \"pass\""));
}

#[test]
fn test_verify_reports_cycle() {
    let tmp = project(
        r#"
[modules.a]
tier = 1
dependencies = ["b"]

[modules.b]
tier = 2
dependencies = ["a"]
"#,
    );

    modguard_cmd()
        .current_dir(tmp.path())
        .arg("verify")
        .assert()
        .failure()
        .stdout(predicate::str::contains("FAIL [structural] Dependency cycle detected"));
}

#[test]
fn test_explicit_config_path() {
    let tmp = project(PASSING);
    let config = tmp.path().join("Modguard.toml");

    modguard_cmd()
        .args(["--config", config.to_str().unwrap(), "verify"])
        .assert()
        .success();
}

#[test]
fn test_missing_config_is_an_error() {
    let tmp = TempDir::new().unwrap();

    modguard_cmd()
        .current_dir(tmp.path())
        .env_remove("MODGUARD_CONFIG")
        .arg("verify")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not find Modguard.toml"));
}
