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
    // Fixed board width keeps the layout deterministic without a terminal
    fs::write(
        &config_file,
        format!("data.location={}\nboard.width=120\n", db_path.display()),
    )
    .unwrap();
    std::env::set_var("HOME", temp_dir.path().to_str().unwrap());
    (temp_dir, guard)
}

fn get_cmd(temp_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("funil").unwrap();
    cmd.env("HOME", temp_dir.path());
    cmd
}

fn add_lead(temp_dir: &TempDir, name: &str, stage: Option<&str>) {
    let mut args: Vec<String> = vec![
        "add".to_string(),
        "-y".to_string(),
        name.to_string(),
        format!("email={}@x.gov", name.to_lowercase()),
        "phone=(45)9999-0000".to_string(),
        "org=Prefeitura X".to_string(),
        "role=Assessora".to_string(),
    ];
    if let Some(stage) = stage {
        args.push(format!("stage={}", stage));
    }
    get_cmd(temp_dir).args(&args).assert().success();
}

#[test]
fn test_board_shows_all_four_columns() {
    let (temp_dir, _guard) = setup_test_env();

    add_lead(&temp_dir, "Ana", None);
    add_lead(&temp_dir, "Bruno", Some("qualified"));

    let output = get_cmd(&temp_dir).args(&["board"]).assert().success();
    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();

    assert!(stdout.contains("NEW (1)"));
    assert!(stdout.contains("QUALIFIED (1)"));
    assert!(stdout.contains("CONTACTED (0)"));
    assert!(stdout.contains("CONVERTED (0)"));
    assert!(stdout.contains("#1 Ana"));
    assert!(stdout.contains("#2 Bruno"));

    drop(temp_dir);
}

#[test]
fn test_board_counts_track_moves() {
    let (temp_dir, _guard) = setup_test_env();

    add_lead(&temp_dir, "Ana", None);
    add_lead(&temp_dir, "Bruno", None);
    get_cmd(&temp_dir).args(&["move", "1", "converted"]).assert().success();

    let output = get_cmd(&temp_dir).args(&["board"]).assert().success();
    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();

    assert!(stdout.contains("NEW (1)"));
    assert!(stdout.contains("CONVERTED (1)"));

    drop(temp_dir);
}

#[test]
fn test_board_single_stage_view() {
    let (temp_dir, _guard) = setup_test_env();

    add_lead(&temp_dir, "Ana", None);
    add_lead(&temp_dir, "Bruno", Some("qualified"));

    let output = get_cmd(&temp_dir)
        .args(&["board", "--stage", "qualified"])
        .assert()
        .success();
    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();

    assert!(stdout.contains("QUALIFIED (1)"));
    assert!(!stdout.contains("NEW ("));
    assert!(stdout.contains("Bruno"));
    assert!(!stdout.contains("Ana"));

    drop(temp_dir);
}

#[test]
fn test_board_search_filter_hides_cards() {
    let (temp_dir, _guard) = setup_test_env();

    add_lead(&temp_dir, "Ana", None);
    add_lead(&temp_dir, "Bruno", None);

    let output = get_cmd(&temp_dir).args(&["board", "ana"]).assert().success();
    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();

    assert!(stdout.contains("NEW (1)"));
    assert!(stdout.contains("Ana"));
    assert!(!stdout.contains("Bruno"));

    drop(temp_dir);
}

#[test]
fn test_board_cards_keep_store_order() {
    let (temp_dir, _guard) = setup_test_env();

    add_lead(&temp_dir, "Older", None);
    add_lead(&temp_dir, "Newer", None);

    let output = get_cmd(&temp_dir).args(&["board"]).assert().success();
    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();

    let newer_pos = stdout.find("Newer").expect("Newer card missing");
    let older_pos = stdout.find("Older").expect("Older card missing");
    assert!(newer_pos < older_pos, "newest lead should be at the top of its column");

    drop(temp_dir);
}

#[test]
fn test_board_empty() {
    let (temp_dir, _guard) = setup_test_env();

    get_cmd(&temp_dir)
        .args(&["board"])
        .assert()
        .success()
        .stdout(predicates::str::contains("No leads on the board."));

    drop(temp_dir);
}

#[test]
fn test_board_invalid_stage_flag() {
    let (temp_dir, _guard) = setup_test_env();

    get_cmd(&temp_dir)
        .args(&["board", "--stage", "done"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("Invalid stage 'done'"));

    drop(temp_dir);
}
