#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;

const PROJECT: &str = r#"
project "acme"
account "123456789012"
region "eu-west-1"

source {
    connection "arn:aws:codestar-connections:eu-west-1:123456789012:connection/abc"
    repository "acme/platform"
}

service "api"
service "web"
"#;

fn write_project(root: &Path) {
    fs::write(root.join("ciflow.kdl"), PROJECT).unwrap();
}

/// ciflow run inside `root` with no stage or root from the environment
fn ciflow(root: &Path) -> Command {
    let mut cmd = Command::cargo_bin("ciflow").unwrap();
    cmd.current_dir(root)
        .env_remove("CIFLOW_PROJECT_ROOT")
        .env_remove("CIFLOW_ENV_STAGE");
    cmd
}

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("ciflow").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("synth"))
        .stdout(predicate::str::contains("diff"))
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("buildspec"));
}

#[test]
fn test_cli_version() {
    let mut cmd = Command::cargo_bin("ciflow").unwrap();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("ciflow"));
}

#[test]
fn test_synth_help() {
    let mut cmd = Command::cargo_bin("ciflow").unwrap();
    cmd.arg("synth")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("[STAGE]"))
        .stdout(predicate::str::contains("--stdout"));
}

#[test]
fn test_invalid_command() {
    let mut cmd = Command::cargo_bin("ciflow").unwrap();
    cmd.arg("invalid-command").assert().failure();
}

#[test]
fn test_validate_without_project() {
    let temp_dir = tempfile::tempdir().unwrap();
    ciflow(temp_dir.path())
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Project root not found"));
}

#[test]
fn test_validate_project() {
    let temp_dir = tempfile::tempdir().unwrap();
    write_project(temp_dir.path());

    ciflow(temp_dir.path())
        .args(["validate", "prod"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("stage prod"))
        .stdout(predicate::str::contains("Services: 2"));
}

#[test]
fn test_validate_reports_missing_source() {
    let temp_dir = tempfile::tempdir().unwrap();
    fs::write(
        temp_dir.path().join("ciflow.kdl"),
        "project \"acme\"\nservice \"api\"\n",
    )
    .unwrap();

    ciflow(temp_dir.path())
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"))
        .stderr(predicate::str::contains("Source is not configured"));
}

#[test]
fn test_validate_rejects_colliding_service_names() {
    let temp_dir = tempfile::tempdir().unwrap();
    fs::write(
        temp_dir.path().join("ciflow.kdl"),
        format!("{}service \"my-api\"\nservice \"my_api\"\n", PROJECT),
    )
    .unwrap();

    ciflow(temp_dir.path())
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"))
        .stderr(predicate::str::contains("MyApiBuildProject"));
}

#[test]
fn test_synth_stdout() {
    let temp_dir = tempfile::tempdir().unwrap();
    write_project(temp_dir.path());

    let output = ciflow(temp_dir.path())
        .args(["synth", "--stdout"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let template: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let resources = template["Resources"].as_object().unwrap();
    assert!(resources.contains_key("ApiBuildProject"));
    assert!(resources.contains_key("WebDeployProject"));
    assert_eq!(
        template["Resources"]["Pipeline"]["Properties"]["Name"],
        "acme-dev"
    );
    assert!(!temp_dir.path().join(".ciflow").exists());
}

#[test]
fn test_synth_then_diff() {
    let temp_dir = tempfile::tempdir().unwrap();
    write_project(temp_dir.path());

    ciflow(temp_dir.path())
        .arg("synth")
        .assert()
        .success()
        .stdout(predicate::str::contains("acme-dev-ci"));
    assert!(temp_dir.path().join(".ciflow/acme-dev-ci.template.json").exists());

    ciflow(temp_dir.path())
        .arg("diff")
        .assert()
        .success()
        .stdout(predicate::str::contains("No changes"));

    // a new service shows up as created resources
    fs::write(
        temp_dir.path().join("ciflow.local.kdl"),
        "service \"billing\"\n",
    )
    .unwrap();
    ciflow(temp_dir.path())
        .arg("diff")
        .assert()
        .success()
        .stdout(predicate::str::contains("BillingDeployProject"))
        .stdout(predicate::str::contains("to create"));
}

#[test]
fn test_diff_compares_against_same_stage_only() {
    let temp_dir = tempfile::tempdir().unwrap();
    write_project(temp_dir.path());

    ciflow(temp_dir.path())
        .args(["synth", "prod"])
        .assert()
        .success();

    // nothing stored for dev yet, so prod's template must not be the baseline
    ciflow(temp_dir.path())
        .args(["diff", "dev"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No previous template"))
        .stdout(predicate::str::contains("0 to update"));

    ciflow(temp_dir.path())
        .args(["synth", "dev"])
        .assert()
        .success();
    ciflow(temp_dir.path())
        .args(["diff", "prod"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No changes"));
}

#[test]
fn test_list_uses_stage_from_env() {
    let temp_dir = tempfile::tempdir().unwrap();
    write_project(temp_dir.path());

    ciflow(temp_dir.path())
        .env("CIFLOW_ENV_STAGE", "stg")
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("acme-stg"))
        .stdout(predicate::str::contains("acme-build-api"))
        .stdout(predicate::str::contains("acme-deploy-web"))
        .stdout(predicate::str::contains("acme-stg-web"));
}

#[test]
fn test_buildspec_deploy_job() {
    let temp_dir = tempfile::tempdir().unwrap();
    write_project(temp_dir.path());

    ciflow(temp_dir.path())
        .args(["buildspec", "api", "--job", "deploy"])
        .assert()
        .success()
        .stdout(predicate::str::contains("make install-serverless"))
        .stdout(predicate::str::contains("make -C services/api install"))
        .stdout(predicate::str::contains("make deploy-api"));
}

#[test]
fn test_buildspec_unknown_service() {
    let temp_dir = tempfile::tempdir().unwrap();
    write_project(temp_dir.path());

    ciflow(temp_dir.path())
        .args(["buildspec", "billing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Service not found: billing"));
}
