//! End-to-end tests for the opcli binary.

#[cfg(unix)]
mod support;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

#[allow(deprecated)]
fn opcli(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("opcli").unwrap();
    cmd.current_dir(dir.path())
        .env("HOME", dir.path())
        .env("XDG_CONFIG_HOME", dir.path().join(".config"))
        .env("NO_COLOR", "1")
        .env_remove("OP_SERVICE_ACCOUNT_TOKEN")
        .env_remove("OPCLI_ACCOUNT")
        .env_remove("OPCLI_LOG");
    cmd
}

#[test]
fn test_help_lists_commands() {
    let dir = TempDir::new().unwrap();
    opcli(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("signin"))
        .stdout(predicate::str::contains("permissions"));
}

#[test]
fn test_permissions_resolves_dependencies() {
    let dir = TempDir::new().unwrap();
    opcli(&dir)
        .args(["permissions", "edit_items"])
        .assert()
        .success()
        .stdout(predicate::str::contains("edit_items"))
        .stdout(predicate::str::contains("view_and_copy_passwords"))
        .stdout(predicate::str::contains("view_items"))
        .stdout(predicate::str::contains("manage_vault").not());
}

#[test]
fn test_unknown_permission_fails() {
    let dir = TempDir::new().unwrap();
    opcli(&dir)
        .args(["permissions", "fly"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown permission: fly"));
}

#[test]
fn test_invalid_config_is_reported() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("opcli.toml"), "colour = \"red\"\n").unwrap();
    opcli(&dir)
        .arg("vaults")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse config file"));
}

#[cfg(unix)]
mod with_fake_op {
    use super::*;
    use crate::support::{respond, FakeOp, ACCOUNTS_JSON, VAULTS_JSON};

    fn configured(fake: &FakeOp) -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("opcli.toml"),
            format!("binary = \"{}\"\n", fake.binary().display()),
        )
        .unwrap();
        dir
    }

    fn fake() -> FakeOp {
        FakeOp::new(&format!(
            "{}{}{}",
            respond("\"account list --format=json\"", ACCOUNTS_JSON),
            "\"signin --account U1 --raw\")\n  echo tok-U1\n  ;;\n",
            respond("\"vault list --account U1 --format=json\"", VAULTS_JSON),
        ))
    }

    #[test]
    fn test_vaults_table() {
        let fake = fake();
        let dir = configured(&fake);

        opcli(&dir)
            .args(["vaults", "--account", "ada@example.com"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Shared"))
            .stdout(predicate::str::contains("NAME"));
    }

    #[test]
    fn test_vaults_json() {
        let fake = fake();
        let dir = configured(&fake);

        let output = opcli(&dir)
            .args(["vaults", "--json", "--account", "U1"])
            .output()
            .unwrap();
        assert!(output.status.success());
        let vaults: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(vaults.as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_several_accounts_need_selection() {
        let fake = fake();
        let dir = configured(&fake);

        opcli(&dir)
            .arg("vaults")
            .assert()
            .failure()
            .stderr(predicate::str::contains("choose one with --account"));
    }

    #[test]
    fn test_accounts_needs_no_signin() {
        let fake = fake();
        let dir = configured(&fake);

        opcli(&dir)
            .arg("accounts")
            .assert()
            .success()
            .stdout(predicate::str::contains("bob@example.com"));
        assert!(fake.calls().iter().all(|c| !c.starts_with("signin")));
    }
}
