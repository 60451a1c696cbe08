use assert_cmd::Command;
use predicates::prelude::*;

fn bin() -> Command {
    Command::cargo_bin("post-client").unwrap()
}

#[test]
fn help_exits_zero() {
    bin()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--app_id"))
        .stdout(predicate::str::contains("--fields"));
}

#[test]
fn bad_flag_exits_with_usage_error() {
    bin().arg("--nope").assert().code(2);
}

#[test]
fn bad_port_exits_with_usage_error() {
    bin().args(["--port", "not-a-port"]).assert().code(2);
}

#[test]
fn missing_fields_file_fails_before_connecting() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("fields.json");

    bin()
        .current_dir(dir.path())
        .args(["--fields", missing.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load fields file"))
        .stderr(predicate::str::contains("Connecting").not());
}

#[test]
fn non_object_fields_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fields.json");
    std::fs::write(&path, "[1, 2]").unwrap();

    bin()
        .arg("--fields")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("JSON object"));
}
