use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use std::fs;
mod test_env;

fn setup_test_env() -> (TempDir, std::sync::MutexGuard<'static, ()>) {
    let guard = test_env::lock_test_env();
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let config_dir = temp_dir.path().join(".funil");
    fs::create_dir_all(&config_dir).unwrap();
    let config_file = config_dir.join("rc");
    fs::write(&config_file, format!("data.location={}\n", db_path.display())).unwrap();
    std::env::set_var("HOME", temp_dir.path().to_str().unwrap());
    (temp_dir, guard)
}

fn get_cmd(temp_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("funil").unwrap();
    cmd.env("HOME", temp_dir.path());
    cmd
}

fn add_lead(temp_dir: &TempDir, name: &str) {
    get_cmd(temp_dir)
        .args(&[
            "add", "-y", name,
            "email=lead@x.gov", "phone=(45)9999-0000", "org=Prefeitura X", "role=Assessora",
            "source=site",
        ])
        .assert()
        .success();
}

#[test]
fn test_modify_contact_fields() {
    let (temp_dir, _guard) = setup_test_env();
    add_lead(&temp_dir, "Ana");

    get_cmd(&temp_dir)
        .args(&["modify", "1", "email=novo@x.gov", "phone=(45)8888-1111", "role=Diretora"])
        .assert()
        .success()
        .stdout(predicates::str::contains("Modified lead 1"));

    let output = get_cmd(&temp_dir).args(&["show", "1"]).assert().success();
    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    assert!(stdout.contains("novo@x.gov"));
    assert!(stdout.contains("(45)8888-1111"));
    assert!(stdout.contains("Diretora"));

    drop(temp_dir);
}

#[test]
fn test_modify_renames_lead() {
    let (temp_dir, _guard) = setup_test_env();
    add_lead(&temp_dir, "Ana");

    get_cmd(&temp_dir)
        .args(&["modify", "1", "Ana", "Clara", "Souza"])
        .assert()
        .success();

    get_cmd(&temp_dir)
        .args(&["show", "1"])
        .assert()
        .success()
        .stdout(predicates::str::contains("Ana Clara Souza"));

    drop(temp_dir);
}

#[test]
fn test_modify_stage_is_rejected_with_hint() {
    let (temp_dir, _guard) = setup_test_env();
    add_lead(&temp_dir, "Ana");

    get_cmd(&temp_dir)
        .args(&["modify", "1", "stage=converted"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("Use 'funil move <id> <stage>'"));

    // Stage is unchanged
    get_cmd(&temp_dir)
        .args(&["show", "1"])
        .assert()
        .success()
        .stdout(predicates::str::contains("[new]"));

    drop(temp_dir);
}

#[test]
fn test_modify_clears_source_with_none() {
    let (temp_dir, _guard) = setup_test_env();
    add_lead(&temp_dir, "Ana");

    get_cmd(&temp_dir)
        .args(&["modify", "1", "source=none"])
        .assert()
        .success();

    let output = get_cmd(&temp_dir).args(&["list", "--json"]).assert().success();
    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let leads: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert!(leads[0]["source"].is_null());

    drop(temp_dir);
}

#[test]
fn test_modify_switches_organization() {
    let (temp_dir, _guard) = setup_test_env();
    add_lead(&temp_dir, "Ana");
    get_cmd(&temp_dir).args(&["orgs", "add", "Secretaria Y"]).assert().success();

    get_cmd(&temp_dir)
        .args(&["modify", "1", "org=Secretaria Y"])
        .assert()
        .success();

    get_cmd(&temp_dir)
        .args(&["show", "1"])
        .assert()
        .success()
        .stdout(predicates::str::contains("Secretaria Y"));

    drop(temp_dir);
}

#[test]
fn test_modify_unknown_lead() {
    let (temp_dir, _guard) = setup_test_env();

    get_cmd(&temp_dir)
        .args(&["modify", "7", "email=x@x.gov"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("Lead 7 not found"));

    drop(temp_dir);
}

#[test]
fn test_modify_without_changes() {
    let (temp_dir, _guard) = setup_test_env();
    add_lead(&temp_dir, "Ana");

    get_cmd(&temp_dir)
        .args(&["modify", "1"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("No modifications specified"));

    drop(temp_dir);
}
