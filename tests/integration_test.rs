use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn slicepie_cmd() -> Command {
    Command::new(env!("CARGO_BIN_EXE_slicepie"))
}

fn run(dir: &Path, args: &[&str]) -> Output {
    slicepie_cmd()
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .unwrap()
}

fn run_json(dir: &Path, args: &[&str]) -> serde_json::Value {
    let output = run(dir, args);
    assert!(
        output.status.success(),
        "{:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

/// Initialized project with Alice (10h at $50) and Bob ($500 cash).
fn project_with_team() -> TempDir {
    let tmp = TempDir::new().unwrap();
    assert!(run(tmp.path(), &["init", "--company", "Acme"]).status.success());

    run_json(
        tmp.path(),
        &["contributor", "add", "Alice", "--rate", "50", "--json"],
    );
    run_json(tmp.path(), &["contributor", "add", "Bob", "--json"]);
    run_json(
        tmp.path(),
        &[
            "contribution", "add", "1", "--type", "time", "--value", "10", "--date",
            "2024-01-15", "--json",
        ],
    );
    run_json(
        tmp.path(),
        &[
            "contribution", "add", "2", "--type", "cash", "--value", "500", "--date",
            "2024-01-20", "--json",
        ],
    );
    tmp
}

fn row<'a>(equity: &'a serde_json::Value, name: &str) -> &'a serde_json::Value {
    equity["rows"]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["name"] == name)
        .unwrap()
}

#[test]
fn test_init_creates_slicepie_directory() {
    let tmp = TempDir::new().unwrap();

    let output = run(tmp.path(), &["init"]);

    assert!(output.status.success());
    assert!(tmp.path().join(".slicepie").exists());
    assert!(tmp.path().join(".slicepie/ledger.loro").exists());
    assert!(tmp.path().join(".slicepie/config.yaml").exists());
}

#[test]
fn test_init_twice_fails() {
    let tmp = TempDir::new().unwrap();
    run(tmp.path(), &["init"]);

    let output = run(tmp.path(), &["init"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Already initialized"));
}

#[test]
fn test_command_without_init_fails() {
    let tmp = TempDir::new().unwrap();

    let output = run(tmp.path(), &["contributor", "list"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Not in a slicepie project"));
}

#[test]
fn test_equity_split() {
    let tmp = project_with_team();

    let equity = run_json(tmp.path(), &["equity", "--json"]);

    assert_eq!(equity["total_slices"].as_f64().unwrap(), 3_000.0);
    let alice = row(&equity, "Alice");
    let bob = row(&equity, "Bob");
    assert_eq!(alice["slices"].as_f64().unwrap(), 1_000.0);
    assert!((alice["percentage"].as_f64().unwrap() - 33.333).abs() < 0.01);
    assert!((bob["percentage"].as_f64().unwrap() - 66.667).abs() < 0.01);
}

#[test]
fn test_delete_and_restore_contributor_cascades() {
    let tmp = project_with_team();

    let event = run_json(tmp.path(), &["contributor", "delete", "1", "--json"]);
    assert_eq!(event["type"], "deleted");
    assert_eq!(event["cascade_count"], 1);

    let equity = run_json(tmp.path(), &["equity", "--json"]);
    assert_eq!(equity["total_slices"].as_f64().unwrap(), 2_000.0);
    assert_eq!(equity["rows"].as_array().unwrap().len(), 1);

    let trash = run_json(tmp.path(), &["trash", "list", "--json"]);
    assert_eq!(trash["contributors"].as_array().unwrap().len(), 1);
    assert_eq!(trash["contributions"][0]["cascaded"], true);

    // Deleting again is a no-op
    let again = run_json(tmp.path(), &["contributor", "delete", "1", "--json"]);
    assert_eq!(again["changed"], false);

    run_json(tmp.path(), &["contributor", "restore", "1", "--json"]);
    let equity = run_json(tmp.path(), &["equity", "--json"]);
    assert_eq!(equity["total_slices"].as_f64().unwrap(), 3_000.0);

    let activity = run_json(tmp.path(), &["activity", "--json"]);
    let events = activity.as_array().unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0]["type"], "restored");
    assert_eq!(events[0]["cascade_count"], 1);
}

#[test]
fn test_separately_deleted_contribution_stays_deleted() {
    let tmp = project_with_team();
    run_json(
        tmp.path(),
        &[
            "contribution", "add", "1", "--type", "idea", "--value", "300", "--json",
        ],
    );

    // Contribution 3 is removed on its own before its contributor goes.
    run_json(tmp.path(), &["contribution", "delete", "3", "--json"]);
    run_json(tmp.path(), &["contributor", "delete", "1", "--json"]);
    run_json(tmp.path(), &["contributor", "restore", "1", "--json"]);

    let equity = run_json(tmp.path(), &["equity", "--json"]);
    assert_eq!(row(&equity, "Alice")["slices"].as_f64().unwrap(), 1_000.0);
}

#[test]
fn test_purge_requires_force_when_not_interactive() {
    let tmp = project_with_team();

    let output = run(tmp.path(), &["contributor", "purge", "1"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--force"));

    let output = run(tmp.path(), &["contributor", "purge", "1", "--force"]);
    assert!(output.status.success());

    let list = run_json(tmp.path(), &["contributor", "list", "--all", "--json"]);
    assert_eq!(list.as_array().unwrap().len(), 1);
    let contributions = run_json(tmp.path(), &["contribution", "list", "--all", "--json"]);
    assert_eq!(contributions.as_array().unwrap().len(), 1);
}

#[test]
fn test_trash_empty() {
    let tmp = project_with_team();
    run_json(tmp.path(), &["contribution", "delete", "2", "--json"]);

    let output = run(tmp.path(), &["trash", "empty", "--force"]);
    assert!(output.status.success());

    let trash = run_json(tmp.path(), &["trash", "list", "--json"]);
    assert!(trash["contributions"].as_array().unwrap().is_empty());
    let contributions = run_json(tmp.path(), &["contribution", "list", "--all", "--json"]);
    assert_eq!(contributions.as_array().unwrap().len(), 1);
}

#[test]
fn test_export_import_round_trip() {
    let source = project_with_team();
    let export_path = source.path().join("ledger.json");
    let output = run(
        source.path(),
        &["export", "--out", export_path.to_str().unwrap()],
    );
    assert!(output.status.success());

    let document: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&export_path).unwrap()).unwrap();
    assert_eq!(document["version"], "1.0");
    assert!(document["exportedAt"].is_string());

    let target = TempDir::new().unwrap();
    run(target.path(), &["init"]);
    let output = run(
        target.path(),
        &["import", export_path.to_str().unwrap(), "--force"],
    );
    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );

    let equity = run_json(target.path(), &["equity", "--json"]);
    assert_eq!(equity["total_slices"].as_f64().unwrap(), 3_000.0);
}

#[test]
fn test_import_rejects_invalid_document() {
    let tmp = project_with_team();
    let bad = tmp.path().join("bad.json");
    std::fs::write(&bad, r#"{"version": "1.0", "contributors": "nope"}"#).unwrap();

    let output = run(tmp.path(), &["import", bad.to_str().unwrap(), "--force"]);
    assert!(!output.status.success());

    // Ledger untouched
    let equity = run_json(tmp.path(), &["equity", "--json"]);
    assert_eq!(equity["total_slices"].as_f64().unwrap(), 3_000.0);
}

#[test]
fn test_valuation_and_dollar_values() {
    let tmp = project_with_team();

    let entry = run_json(
        tmp.path(),
        &["valuation", "set-manual", "300000", "--json"],
    );
    assert_eq!(entry["mode"], "manual");

    let equity = run_json(tmp.path(), &["equity", "--value", "--json"]);
    let alice = row(&equity, "Alice");
    assert!((alice["dollar_value"].as_f64().unwrap() - 100_000.0).abs() < 1.0);

    let entry = run_json(
        tmp.path(),
        &[
            "valuation", "set-auto", "-p", "2023=100000", "-p", "2024=150000", "--churn", "10",
            "--json",
        ],
    );
    assert_eq!(entry["mode"], "auto");
    assert_eq!(entry["confidence"], "medium");

    let history = run_json(tmp.path(), &["valuation", "history", "--json"]);
    assert_eq!(history.as_array().unwrap().len(), 2);
    assert_eq!(history[0]["mode"], "auto");
}

#[test]
fn test_vesting_status_and_projection() {
    let tmp = TempDir::new().unwrap();
    run(tmp.path(), &["init"]);
    run_json(
        tmp.path(),
        &[
            "contributor", "add", "Carol", "--rate", "100", "--vesting-start", "2024-01-01",
            "--cliff", "12", "--vesting-months", "48", "--json",
        ],
    );
    run_json(
        tmp.path(),
        &[
            "contribution", "add", "1", "--type", "time", "--value", "24", "--date",
            "2024-01-10", "--json",
        ],
    );

    let before_cliff = run_json(
        tmp.path(),
        &["vesting", "1", "--as-of", "2024-06-01", "--json"],
    );
    assert_eq!(before_cliff["status"]["state"], "pre_cliff");
    assert_eq!(before_cliff["status"]["vested_slices"].as_f64().unwrap(), 0.0);

    let at_two_years = run_json(
        tmp.path(),
        &[
            "vesting", "1", "--as-of", "2026-01-01", "--project", "24", "--step", "12", "--json",
        ],
    );
    assert_eq!(at_two_years["status"]["state"], "vesting");
    assert_eq!(
        at_two_years["status"]["vested_slices"].as_f64().unwrap(),
        1_600.0
    );
    let projection = at_two_years["projection"].as_array().unwrap();
    assert_eq!(projection.len(), 3);
    assert_eq!(projection[2]["state"], "fully_vested");
}

#[test]
fn test_invalid_contribution_is_rejected() {
    let tmp = project_with_team();

    let output = run(
        tmp.path(),
        &["contribution", "add", "1", "--type", "cash", "--value", "-5"],
    );
    assert!(!output.status.success());

    let output = run(
        tmp.path(),
        &["contribution", "add", "1", "--type", "bribe", "--value", "5"],
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid contribution type"));
}
