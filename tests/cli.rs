//! End-to-end tests driving the `calendar` binary.

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

/// A command isolated from the caller's settings files and environment.
fn calendar(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("calendar").unwrap();
    cmd.current_dir(dir.path())
        .env("HOME", dir.path())
        .env("XDG_CONFIG_HOME", dir.path())
        .env_remove("CALENDAR_CONFIG")
        .env_remove("CALENDAR_DATABASE__WORKMODE")
        .env_remove("CALENDAR_DATABASE__SQLITE__DSN")
        .env_remove("RUST_LOG")
        .arg("--quiet");
    cmd
}

fn sqlite(dir: &TempDir) -> Command {
    let dsn = dir.path().join("events.db");
    let mut cmd = calendar(dir);
    cmd.arg("--workmode").arg("sqlite").arg("--dsn").arg(dsn);
    cmd
}

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).unwrap()
}

fn create(dir: &TempDir, title: &str, start: &str, end: &str, user: &str) -> i64 {
    let output = sqlite(dir)
        .args(["event", "create", "--title", title, "--start", start, "--end", end])
        .args(["--user", user, "--notify", "15m"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{output:?}");
    String::from_utf8(output.stdout).unwrap().trim().parse().unwrap()
}

#[test]
fn test_event_lifecycle_against_sqlite_file() {
    let dir = TempDir::new().unwrap();

    let id = create(
        &dir,
        "standup",
        "2025-09-15T10:00:00+02:00",
        "2025-09-15T10:15:00+02:00",
        "7",
    );
    assert!(id > 0);

    let output = sqlite(&dir)
        .args(["--json", "event", "get", &id.to_string()])
        .output()
        .unwrap();
    assert!(output.status.success());
    let event = stdout_json(&output);
    assert_eq!(event["id"], id);
    assert_eq!(event["title"], "standup");
    assert_eq!(event["user_id"], 7);
    assert_eq!(event["start_time"], "2025-09-15T08:00:00Z");
    assert_eq!(event["notify_period"], "15m");

    sqlite(&dir)
        .args(["event", "update", &id.to_string(), "--title", "retro"])
        .args(["--start", "2025-09-16T08:00:00Z", "--end", "2025-09-16T09:00:00Z"])
        .args(["--user", "7"])
        .assert()
        .success();

    sqlite(&dir)
        .args(["event", "delete", &id.to_string()])
        .assert()
        .success();

    sqlite(&dir)
        .args(["event", "get", &id.to_string()])
        .assert()
        .code(3);
}

#[test]
fn test_list_filters_and_orders() {
    let dir = TempDir::new().unwrap();

    let late = create(&dir, "late", "2025-09-15T14:00:00Z", "2025-09-15T15:00:00Z", "1");
    let early = create(&dir, "early", "2025-09-15T09:00:00Z", "2025-09-15T10:00:00Z", "1");
    create(&dir, "other", "2025-09-15T11:00:00Z", "2025-09-15T12:00:00Z", "2");

    let output = sqlite(&dir)
        .args(["--json", "event", "list", "--user", "1"])
        .args(["--from", "2025-09-15T09:00:00Z", "--to", "2025-09-15T14:00:00Z"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let listing = stdout_json(&output);
    assert_eq!(listing["count"], 2);
    let ids: Vec<i64> = listing["events"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![early, late]);
}

#[test]
fn test_missing_event_reports_structured_error() {
    let dir = TempDir::new().unwrap();

    let output = sqlite(&dir)
        .args(["--json", "event", "delete", "999"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));

    let err: Value = serde_json::from_slice(&output.stderr).unwrap();
    assert_eq!(err["error"]["code"], "EVENT_NOT_FOUND");
    assert_eq!(err["error"]["exit_code"], 3);
}

#[test]
fn test_memory_workmode_starts_empty() {
    let dir = TempDir::new().unwrap();

    calendar(&dir)
        .args(["event", "list"])
        .assert()
        .success()
        .stdout("No events found.\n");
}

#[test]
fn test_settings_file_selects_backend() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("calendar.toml"),
        "[database]\nworkmode = \"sqlite\"\n\n[database.sqlite]\nname = \"from-file\"\n",
    )
    .unwrap();

    calendar(&dir)
        .args(["event", "list"])
        .assert()
        .success();

    assert!(dir.path().join("from-file.db").exists());
}

#[test]
fn test_missing_explicit_config_is_config_error() {
    let dir = TempDir::new().unwrap();

    calendar(&dir)
        .args(["--config", "nope.toml", "version"])
        .assert()
        .code(7);
}

#[test]
fn test_version_json() {
    let dir = TempDir::new().unwrap();

    let output = calendar(&dir).args(["--json", "version"]).output().unwrap();
    assert!(output.status.success());
    let version = stdout_json(&output);
    assert_eq!(version["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(version["schema"], 1);
}
