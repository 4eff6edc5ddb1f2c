use assert_cmd::Command;
use predicates::prelude::*;

#[allow(deprecated)]
fn mvnget_cmd() -> Command {
    Command::cargo_bin("mvnget").unwrap()
}

#[test]
fn test_version_flag() {
    mvnget_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_compare_prints_ordering() {
    mvnget_cmd()
        .args(["compare", "1.0-SNAPSHOT", "1.0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1.0-SNAPSHOT < 1.0"));

    mvnget_cmd()
        .args(["compare", "1.10", "1.9"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1.10 > 1.9"));
}

#[test]
fn test_compare_invalid_version_fails() {
    mvnget_cmd()
        .args(["compare", "[1.0]", "1.0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid version"));
}

#[test]
fn test_fetch_requires_an_artifact() {
    mvnget_cmd().args(["fetch"]).assert().failure();
}
