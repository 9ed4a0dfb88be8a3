use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn devicefarm() -> Command {
    Command::cargo_bin("devicefarm").unwrap()
}

#[test]
fn validate_accepts_minimal_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("devicefarm.toml");
    std::fs::write(
        &path,
        r#"
[devicefarm]
project_name = "MyProject"
"#,
    )
    .unwrap();

    devicefarm()
        .arg("-c")
        .arg(&path)
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid!"))
        .stdout(predicate::str::contains("Project: MyProject"))
        .stdout(predicate::str::contains("Device pool: Top Devices"))
        .stdout(predicate::str::contains("Test type: instrumentation"));
}

#[test]
fn validate_rejects_empty_project_name() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("devicefarm.toml");
    std::fs::write(
        &path,
        r#"
[devicefarm]
project_name = ""
"#,
    )
    .unwrap();

    devicefarm()
        .arg("-c")
        .arg(&path)
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"))
        .stderr(predicate::str::contains("project_name"));
}

#[test]
fn validate_reports_missing_file() {
    let dir = TempDir::new().unwrap();

    devicefarm()
        .arg("-c")
        .arg(dir.path().join("absent.toml"))
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"));
}

#[test]
fn init_writes_a_config_that_validates() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("devicefarm.toml");

    devicefarm()
        .arg("-c")
        .arg(&path)
        .args(["init", "--project", "Storefront", "-t", "fuzz"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created"));

    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains(r#"project_name = "Storefront""#));
    assert!(written.contains(r#"type = "fuzz""#));

    devicefarm()
        .arg("-c")
        .arg(&path)
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Test type: fuzz"));
}

#[test]
fn init_refuses_to_overwrite() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("devicefarm.toml");
    std::fs::write(&path, "# keep me\n").unwrap();

    devicefarm()
        .arg("-c")
        .arg(&path)
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "# keep me\n");
}

#[test]
fn init_rejects_unknown_test_type() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("devicefarm.toml");

    devicefarm()
        .arg("-c")
        .arg(&path)
        .args(["init", "-t", "espresso-classic"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown test type"));

    assert!(!path.exists());
}

#[test]
fn init_escapes_project_name() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("devicefarm.toml");
    let project = r#"Team "Mobile" \ Nightly"#;

    devicefarm()
        .arg("-c")
        .arg(&path)
        .args(["init", "--project", project])
        .assert()
        .success();

    let config = devicefarm::config::load_config(&path).unwrap();
    assert_eq!(config.devicefarm.project_name, project);
}

#[test]
fn submit_requires_app() {
    devicefarm()
        .arg("submit")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--app"));
}

#[test]
fn submit_instrumentation_requires_test_package() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("devicefarm.toml");
    std::fs::write(
        &path,
        r#"
[devicefarm]
project_name = "MyProject"

[aws]
command = "definitely-not-an-aws-cli-binary"
"#,
    )
    .unwrap();

    devicefarm()
        .arg("-c")
        .arg(&path)
        .args(["submit", "--app", "app.apk"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "--test-package is required for instrumentation tests",
        ));
}

#[test]
fn submit_fuzz_runs_without_test_package() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("devicefarm.toml");
    std::fs::write(
        &path,
        r#"
[devicefarm]
project_name = "MyProject"

[aws]
command = "definitely-not-an-aws-cli-binary"

[test]
type = "fuzz"
"#,
    )
    .unwrap();

    // Gets as far as listing projects, which fails on the bogus command.
    devicefarm()
        .arg("-c")
        .arg(&path)
        .args(["submit", "--app", "app.apk"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--test-package").not())
        .stderr(predicate::str::contains("list-projects"));
}
