use assert_cmd::Command;
use predicates::prelude::*;

fn dynitf() -> Command {
    let mut cmd = Command::cargo_bin("dynitf").unwrap();
    cmd.env("RUST_LOG", "warn");
    cmd
}

#[test]
fn test_layout_of_sample_class() {
    dynitf()
        .args(["layout", "--class", "demo_player"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Class demo_player (64 bytes)"))
        .stdout(predicate::str::contains("equalizer"))
        .stdout(predicate::str::contains("bytes=24"));
}

#[test]
fn test_unknown_class_fails() {
    dynitf()
        .args(["layout", "--class", "missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown class 'missing'"));
}

#[test]
fn test_demo_synchronous() {
    dynitf()
        .args(["demo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ResourcesLost"))
        .stdout(predicate::str::contains("AsyncTermination").not())
        .stdout(predicate::str::contains("torn down"));
}

#[test]
fn test_demo_asynchronous() {
    dynitf()
        .args(["demo", "--async"])
        .assert()
        .success()
        .stdout(predicate::str::contains("AsyncTermination"))
        .stdout(predicate::str::contains("torn down"));
}

#[test]
fn test_init_then_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dynitf.toml");

    dynitf()
        .arg("init")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration initialized"));
    assert!(path.exists());

    dynitf()
        .arg("--config")
        .arg(&path)
        .args(["layout", "--class", "demo_player"])
        .assert()
        .success()
        .stdout(predicate::str::contains("seek"));
}
