//! E2E tests for the `jt` command surface.
//!
//! Each test seeds a store file in an isolated temp directory through the
//! core crate, then runs `jt` as a subprocess against it.

use assert_cmd::Command;
use jobtrail_core::db::{RecordStore, SqliteStore};
use jobtrail_core::ledger::Ledger;
use jobtrail_core::model::{ApplicationRecord, EventDoc};
use predicates::prelude::*;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Test Harness
// ---------------------------------------------------------------------------

fn jt_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("jt"));
    cmd.current_dir(dir);
    cmd.env("JOBTRAIL_LOG", "error");
    cmd.env_remove("JOBTRAIL_DB");
    cmd.env_remove("FORMAT");
    cmd
}

fn legacy_event(event_type: &str, notes: &str, date: &str) -> EventDoc {
    EventDoc {
        id: Some(format!("legacy-{date}")),
        event_type: Some(event_type.to_string()),
        status_id: Some("status-1".to_string()),
        status_name: Some(event_type.to_string()),
        notes: Some(notes.to_string()),
        date: Some(date.to_string()),
        ..EventDoc::default()
    }
}

/// Create a store with two legacy-shaped applications; returns its path.
fn seed_store(dir: &Path) -> PathBuf {
    let path = dir.join("jobtrail.db");
    let store = SqliteStore::open(&path).expect("open store");
    store
        .insert_applications(&[
            ApplicationRecord::new("app-1", "user-1")
                .with_events(vec![legacy_event("Phone Call", "went well", "2025-03-01")]),
            ApplicationRecord::new("app-2", "user-2").with_events(vec![
                legacy_event("Applied", "via referral", "2025-01-10"),
                legacy_event("Rejected", "form letter", "2025-02-01"),
            ]),
        ])
        .expect("seed records");
    store.close().expect("close store");
    path
}

fn json_output(cmd: &mut Command) -> Value {
    let output = cmd.output().expect("jt should not crash");
    assert!(
        output.status.success(),
        "jt failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("--json should produce valid JSON")
}

fn records(path: &Path) -> Vec<ApplicationRecord> {
    SqliteStore::open(path)
        .expect("open store")
        .scan_applications()
        .expect("scan")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn run_applies_all_units_and_validates() {
    let dir = TempDir::new().expect("tempdir");
    let db = seed_store(dir.path());

    let json = json_output(jt_cmd(dir.path()).args(["run", "--json", "--db"]).arg(&db));
    let results = json["run"]["results"].as_array().expect("results array");
    let ids: Vec<_> = results.iter().filter_map(|r| r["id"].as_str()).collect();
    assert_eq!(ids, vec!["001", "002", "003", "004", "005", "006"]);
    assert!(results.iter().all(|r| r["success"] == true));
    assert_eq!(json["validation"]["legacy_records"], 0);
    assert_eq!(json["validation"]["canonical_records"], 2);

    let stored = records(&db);
    let declined = stored[1].current_status.as_ref().expect("status");
    assert_eq!(declined.name, "Declined");
}

#[test]
fn second_run_skips_completed_units() {
    let dir = TempDir::new().expect("tempdir");
    let db = seed_store(dir.path());

    jt_cmd(dir.path()).arg("run").arg("--db").arg(&db).assert().success();
    let after_first = records(&db);

    let json = json_output(jt_cmd(dir.path()).args(["run", "--json", "--db"]).arg(&db));
    assert_eq!(json["run"]["results"].as_array().map(Vec::len), Some(0));
    assert_eq!(json["run"]["skipped"].as_array().map(Vec::len), Some(6));
    assert_eq!(records(&db), after_first);
}

#[test]
fn dry_run_reports_without_writing() {
    let dir = TempDir::new().expect("tempdir");
    let db = seed_store(dir.path());
    let before = records(&db);

    let json = json_output(jt_cmd(dir.path()).args(["dry-run", "--json", "--db"]).arg(&db));
    assert_eq!(json["run"]["dry_run"], true);
    assert!(json.get("validation").is_none());
    let first = &json["run"]["results"][0];
    assert_eq!(first["documents_modified"], 2);

    assert_eq!(records(&db), before);
    let store = SqliteStore::open(&db).expect("open store");
    assert!(store.entries().expect("ledger").is_empty());
}

#[test]
fn force_reruns_completed_units() {
    let dir = TempDir::new().expect("tempdir");
    let db = seed_store(dir.path());
    jt_cmd(dir.path()).arg("run").arg("--db").arg(&db).assert().success();

    let json = json_output(jt_cmd(dir.path()).args(["force", "--json", "--db"]).arg(&db));
    assert_eq!(json["run"]["force"], true);
    assert_eq!(json["run"]["results"].as_array().map(Vec::len), Some(6));
}

#[test]
fn rollback_of_irreversible_unit_fails() {
    let dir = TempDir::new().expect("tempdir");
    let db = seed_store(dir.path());
    jt_cmd(dir.path()).arg("run").arg("--db").arg(&db).assert().success();

    jt_cmd(dir.path())
        .args(["rollback", "004", "--db"])
        .arg(&db)
        .assert()
        .failure()
        .stderr(predicate::str::contains("E2003"));

    let store = SqliteStore::open(&db).expect("open store");
    assert!(store.has_run("004").expect("ledger"));
}

#[test]
fn rollback_advises_a_backup_for_every_known_unit() {
    let dir = TempDir::new().expect("tempdir");
    let db = seed_store(dir.path());

    for id in ["004", "006"] {
        jt_cmd(dir.path())
            .env("JOBTRAIL_LOG", "warn")
            .args(["rollback", id, "--db"])
            .arg(&db)
            .assert()
            .stderr(predicate::str::contains("no automatic backup"));
    }

    jt_cmd(dir.path())
        .env("JOBTRAIL_LOG", "warn")
        .args(["rollback", "999", "--db"])
        .arg(&db)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no automatic backup").not());
}

#[test]
fn rollback_of_backfill_removes_generated_events() {
    let dir = TempDir::new().expect("tempdir");
    let db = seed_store(dir.path());
    jt_cmd(dir.path()).arg("run").arg("--db").arg(&db).assert().success();

    let json = json_output(jt_cmd(dir.path()).args(["rollback", "006", "--json", "--db"]).arg(&db));
    assert_eq!(json["success"], true);
    assert_eq!(json["documents_modified"], 2);

    let stored = records(&db);
    assert_eq!(stored[0].events.len(), 1);
    let store = SqliteStore::open(&db).expect("open store");
    assert!(!store.has_run("006").expect("ledger"));
}

#[test]
fn unknown_rollback_id_is_rejected() {
    let dir = TempDir::new().expect("tempdir");
    let db = seed_store(dir.path());

    jt_cmd(dir.path())
        .args(["rollback", "999", "--json", "--db"])
        .arg(&db)
        .assert()
        .failure()
        .stderr(predicate::str::contains("E2001"));
}

#[test]
fn validate_reports_legacy_records() {
    let dir = TempDir::new().expect("tempdir");
    let db = seed_store(dir.path());

    let json = json_output(jt_cmd(dir.path()).args(["validate", "--json", "--db"]).arg(&db));
    assert_eq!(json["total_records"], 2);
    assert_eq!(json["legacy_records"], 2);
    assert_eq!(json["mixed_records"], 0);
}

#[test]
fn validate_tolerates_an_undecodable_document() {
    let dir = TempDir::new().expect("tempdir");
    let db = seed_store(dir.path());
    let conn = rusqlite::Connection::open(&db).expect("raw open");
    conn.execute(
        "INSERT INTO applications (id, user_id, document) VALUES ('bad', 'u', '[1,2]')",
        [],
    )
    .expect("raw insert");
    drop(conn);

    let json = json_output(jt_cmd(dir.path()).args(["validate", "--json", "--db"]).arg(&db));
    assert_eq!(json["total_records"], 3);
    assert_eq!(json["legacy_records"], 2);
    assert_eq!(json["undecodable_records"], 1);
    assert_eq!(json["undecodable_record_ids"][0], "bad");
}

#[test]
fn status_lists_ledger_state() {
    let dir = TempDir::new().expect("tempdir");
    let db = seed_store(dir.path());

    jt_cmd(dir.path())
        .args(["status", "--db"])
        .arg(&db)
        .assert()
        .success()
        .stdout(predicate::str::contains("001\tpending\treversible"))
        .stdout(predicate::str::contains("004\tpending\tirreversible"));

    jt_cmd(dir.path()).arg("run").arg("--db").arg(&db).assert().success();
    jt_cmd(dir.path())
        .args(["status", "--db"])
        .arg(&db)
        .assert()
        .success()
        .stdout(predicate::str::contains("006\tapplied"));
}

#[test]
fn store_path_comes_from_environment_and_config() {
    let dir = TempDir::new().expect("tempdir");
    let db = seed_store(dir.path());

    jt_cmd(dir.path())
        .env("JOBTRAIL_DB", &db)
        .args(["validate", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"total_records\": 2"));

    let config_dir = dir.path().join(".jobtrail");
    std::fs::create_dir_all(&config_dir).expect("config dir");
    std::fs::write(
        config_dir.join("config.toml"),
        format!("[store]\npath = {:?}\n", db.display().to_string()),
    )
    .expect("write config");
    jt_cmd(dir.path())
        .args(["validate", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"total_records\": 2"));
}

#[test]
fn malformed_config_fails_with_config_code() {
    let dir = TempDir::new().expect("tempdir");
    let config_dir = dir.path().join(".jobtrail");
    std::fs::create_dir_all(&config_dir).expect("config dir");
    std::fs::write(config_dir.join("config.toml"), "[store\n").expect("write config");

    jt_cmd(dir.path())
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("E1002"));
}

#[test]
fn unopenable_store_fails_before_any_unit() {
    let dir = TempDir::new().expect("tempdir");
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, "plain file").expect("write blocker");

    jt_cmd(dir.path())
        .args(["run", "--db"])
        .arg(blocker.join("jobtrail.db"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("E1001"));
}
