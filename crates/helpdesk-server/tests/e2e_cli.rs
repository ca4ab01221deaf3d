//! E2E tests for the `helpdesk` binary's non-serving commands.
//!
//! Each test runs the binary as a subprocess in an isolated temp directory.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

fn helpdesk_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("helpdesk"));
    cmd.current_dir(dir);
    cmd.env("HELPDESK_LOG", "error");
    cmd.env_remove("HELPDESK_DB");
    cmd.env_remove("HELPDESK_LISTEN");
    cmd
}

#[test]
fn init_creates_default_database() {
    let dir = TempDir::new().expect("temp dir");

    helpdesk_cmd(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("schema v2"));

    assert!(dir.path().join("helpdesk.db").exists());
}

#[test]
fn init_honours_db_flag_and_is_repeatable() {
    let dir = TempDir::new().expect("temp dir");
    let db = dir.path().join("data").join("tickets.db");

    for _ in 0..2 {
        helpdesk_cmd(dir.path())
            .args(["init", "--db"])
            .arg(&db)
            .assert()
            .success();
    }
    assert!(db.exists());
}

#[test]
fn init_reads_store_path_from_config_file() {
    let dir = TempDir::new().expect("temp dir");
    std::fs::write(
        dir.path().join("helpdesk.toml"),
        "[store]\npath = \"from-config.db\"\n",
    )
    .expect("write config");

    helpdesk_cmd(dir.path()).arg("init").assert().success();
    assert!(dir.path().join("from-config.db").exists());
}

#[test]
fn invalid_config_fails_with_message() {
    let dir = TempDir::new().expect("temp dir");
    std::fs::write(dir.path().join("helpdesk.toml"), "[tickets]\nprefix = \"IN-F\"\n")
        .expect("write config");

    helpdesk_cmd(dir.path())
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("tickets.prefix"));
}
