// CLI smoke coverage: each invocation runs the real binary in a temp
// directory holding its own boardroom.toml and json store.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

fn boardroom(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("boardroom").unwrap();
    cmd.current_dir(dir);
    cmd
}

/// Pulls the created project id out of the json store layout; `project
/// create` stores one document per file named after the id.
fn sole_project_id(dir: &Path) -> String {
    let projects = dir.join(".boardroom").join("projects");
    let mut ids: Vec<String> = std::fs::read_dir(projects)
        .unwrap()
        .map(|entry| {
            entry
                .unwrap()
                .path()
                .file_stem()
                .unwrap()
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    assert_eq!(ids.len(), 1, "expected exactly one project in the store");
    ids.pop().unwrap()
}

#[test]
fn help_lists_the_governance_surface() {
    Command::cargo_bin("boardroom")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("project"))
        .stdout(predicate::str::contains("admin"))
        .stdout(predicate::str::contains("archive"))
        .stdout(predicate::str::contains("task"));
}

#[test]
fn init_writes_the_config_and_store_layout() {
    let dir = TempDir::new().unwrap();

    boardroom(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("boardroom.toml"));

    assert!(dir.path().join("boardroom.toml").exists());
    assert!(dir.path().join(".boardroom").join("projects").is_dir());

    // Second run refuses to clobber, --force goes through.
    boardroom(dir.path()).arg("init").assert().failure();
    boardroom(dir.path())
        .args(["init", "--force"])
        .assert()
        .success();
}

#[test]
fn a_full_archive_round_runs_through_the_binary() {
    let dir = TempDir::new().unwrap();
    boardroom(dir.path()).arg("init").assert().success();

    boardroom(dir.path())
        .args([
            "project", "create", "--name", "cli fixture", "--member", "ana", "--as", "olive",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created project 'cli fixture'"));

    let id = sole_project_id(dir.path());

    boardroom(dir.path())
        .args(["admin", "promote", &id, "ana", "--as", "olive"])
        .assert()
        .success()
        .stdout(predicate::str::contains("admin"));

    boardroom(dir.path())
        .args(["archive", "start", &id, "--as", "olive"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1/2 approvals"));

    // The requester cannot vote on their own round.
    boardroom(dir.path())
        .args(["archive", "approve", &id, "--as", "olive"])
        .assert()
        .failure();

    boardroom(dir.path())
        .args(["archive", "approve", &id, "--as", "ana"])
        .assert()
        .success()
        .stdout(predicate::str::contains("archived"));

    boardroom(dir.path())
        .args(["project", "show", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("lifecycle: archived"));
}

#[test]
fn removal_votes_and_vetoes_flow_through_the_binary() {
    let dir = TempDir::new().unwrap();
    boardroom(dir.path()).arg("init").assert().success();

    boardroom(dir.path())
        .args([
            "project", "create", "--name", "veto fixture", "--member", "ana", "--member", "ben",
            "--as", "olive",
        ])
        .assert()
        .success();
    let id = sole_project_id(dir.path());

    for target in ["ana", "ben"] {
        boardroom(dir.path())
            .args(["admin", "promote", &id, target, "--as", "olive"])
            .assert()
            .success();
    }

    boardroom(dir.path())
        .args(["admin", "remove", &id, "ben", "--as", "ana"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1/2 approvals"));

    // ben dissents on a round targeting him: forbidden.
    boardroom(dir.path())
        .args(["admin", "reject", &id, "ben", "--as", "ben"])
        .assert()
        .failure();

    boardroom(dir.path())
        .args(["admin", "reject", &id, "ben", "--as", "olive"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cancelled"));

    boardroom(dir.path())
        .args(["project", "show", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("ben (admin)"));
}

#[test]
fn tasks_freeze_once_the_project_is_archived() {
    let dir = TempDir::new().unwrap();
    boardroom(dir.path()).arg("init").assert().success();

    boardroom(dir.path())
        .args([
            "project", "create", "--name", "frozen fixture", "--member", "ana", "--as", "olive",
        ])
        .assert()
        .success();
    let id = sole_project_id(dir.path());

    boardroom(dir.path())
        .args([
            "task", "create", &id, "--title", "write the postmortem", "--assignee", "ana",
            "--as", "olive",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("write the postmortem"));

    // Sole admin: archiving is immediate.
    boardroom(dir.path())
        .args(["archive", "start", &id, "--as", "olive"])
        .assert()
        .success()
        .stdout(predicate::str::contains("archived"));

    boardroom(dir.path())
        .args([
            "task", "create", &id, "--title", "one more thing", "--assignee", "ana", "--as",
            "olive",
        ])
        .assert()
        .failure();
}

#[test]
fn mutating_commands_require_an_acting_principal() {
    let dir = TempDir::new().unwrap();
    boardroom(dir.path()).arg("init").assert().success();

    boardroom(dir.path())
        .args(["project", "create", "--name", "nobody's project"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--as"));
}
