//! End-to-end tests of the `stow` binary against an unreachable remote.
//!
//! The configured base URL points at a port nothing listens on, so these
//! cover the offline degrade paths: local-only file view, fail-soft store
//! loading, notification fallback, and activity export.

use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::TempDir;

fn stow_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("stow");
    path
}

fn setup_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let data_dir = root.join("app_data");
    fs::create_dir_all(&data_dir).unwrap();

    let config_path = root.join("stow.toml");
    fs::write(
        &config_path,
        format!(
            r#"[remote]
base_url = "http://127.0.0.1:1"
api_key = "test-key"
request_timeout_secs = 1

[storage]
data_dir = "{}"

[health]
store_interval_secs = 1
assistant_interval_secs = 1
probe_timeout_secs = 1

[notify]
enabled = false
"#,
            data_dir.display()
        ),
    )
    .unwrap();

    (tmp, config_path)
}

fn run_stow(config: &PathBuf, args: &[&str]) -> std::process::Output {
    Command::new(stow_binary())
        .arg("--config")
        .arg(config)
        .args(args)
        .output()
        .expect("failed to run stow binary")
}

fn seed_registry(config: &PathBuf, records: &str) {
    let data_dir = config.parent().unwrap().join("app_data");
    fs::write(data_dir.join("upload_history.json"), records).unwrap();
}

#[test]
fn files_degrades_to_local_view_when_remote_down() {
    let (_tmp, config) = setup_env();
    seed_registry(
        &config,
        r#"{
  "report.pdf": {
    "display_name": "report.pdf",
    "content_digest": "d1",
    "remote_id": "id-1",
    "uploaded_by": "alice",
    "first_seen_at": "2024-03-01T12:00:00Z",
    "last_seen_at": "2024-03-01T12:00:00Z",
    "upload_count": 1
  }
}"#,
    );

    let output = run_stow(&config, &["files"]);
    assert!(output.status.success(), "stow files failed: {:?}", output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("local records only"));
    assert!(stdout.contains("report.pdf"));
    assert!(stdout.contains("alice"));
    assert!(stdout.contains("offline view"));
}

#[test]
fn files_with_empty_registry_reports_nothing_tracked() {
    let (_tmp, config) = setup_env();
    let output = run_stow(&config, &["files"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("No files tracked"));
}

#[test]
fn corrupt_registry_does_not_break_startup() {
    let (_tmp, config) = setup_env();
    seed_registry(&config, "{this is not json");

    let output = run_stow(&config, &["files"]);
    assert!(output.status.success(), "stow files failed: {:?}", output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("No files tracked"));
}

#[test]
fn upload_without_known_user_asks_for_one() {
    let (_tmp, config) = setup_env();
    let file = config.parent().unwrap().join("doc.txt");
    fs::write(&file, "content").unwrap();

    let output = run_stow(&config, &["upload", file.to_str().unwrap()]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--user"));
}

#[test]
fn upload_against_dead_remote_fails_without_tracking() {
    let (_tmp, config) = setup_env();
    let file = config.parent().unwrap().join("doc.txt");
    fs::write(&file, "content").unwrap();

    let output = run_stow(
        &config,
        &["upload", file.to_str().unwrap(), "--user", "alice"],
    );
    assert!(!output.status.success());

    // Nothing was tracked for the failed transmit, but the user name stuck.
    let data_dir = config.parent().unwrap().join("app_data");
    assert!(!data_dir.join("upload_history.json").exists());
    let settings = fs::read_to_string(data_dir.join("user_settings.json")).unwrap();
    assert!(settings.contains("alice"));
}

#[test]
fn delete_without_remote_id_needs_opt_in() {
    let (_tmp, config) = setup_env();
    seed_registry(
        &config,
        r#"{
  "local.txt": {
    "display_name": "local.txt",
    "content_digest": "dl",
    "remote_id": null,
    "uploaded_by": "alice",
    "first_seen_at": "2024-03-01T12:00:00Z",
    "last_seen_at": "2024-03-01T12:00:00Z",
    "upload_count": 1
  }
}"#,
    );

    let output = run_stow(&config, &["delete", "local.txt"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("--local-only"));

    let output = run_stow(&config, &["delete", "local.txt", "--local-only"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("removed from local registry"));

    let registry = fs::read_to_string(
        config.parent().unwrap().join("app_data").join("upload_history.json"),
    )
    .unwrap();
    assert!(!registry.contains("local.txt"));
}

#[test]
fn notify_always_succeeds_and_reports_tier() {
    let (_tmp, config) = setup_env();
    let output = run_stow(&config, &["notify", "Test Title", "test body"]);
    assert!(output.status.success(), "stow notify failed: {:?}", output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    // Notifications are disabled in the test config, so the log tier wins.
    assert!(stdout.contains("Delivered via log tier"));

    let log = fs::read_to_string(
        config.parent().unwrap().join("app_data").join("notifications.log"),
    )
    .unwrap();
    assert!(log.contains("Test Title"));
    assert!(log.contains("test body"));
}

#[test]
fn user_settings_opt_out_forces_log_tier() {
    let tmp = TempDir::new().unwrap();
    let data_dir = tmp.path().join("app_data");
    fs::create_dir_all(&data_dir).unwrap();
    fs::write(
        data_dir.join("user_settings.json"),
        r#"{"user_name": "alice", "notifications_enabled": false}"#,
    )
    .unwrap();

    let config = tmp.path().join("stow.toml");
    fs::write(
        &config,
        format!(
            r#"[remote]
base_url = "http://127.0.0.1:1"
api_key = "test-key"
request_timeout_secs = 1

[storage]
data_dir = "{}"

[notify]
enabled = true
"#,
            data_dir.display()
        ),
    )
    .unwrap();

    let output = run_stow(&config, &["notify", "Quiet Title", "quiet body"]);
    assert!(output.status.success(), "stow notify failed: {:?}", output);
    assert!(String::from_utf8_lossy(&output.stdout).contains("Delivered via log tier"));
    let log = fs::read_to_string(data_dir.join("notifications.log")).unwrap();
    assert!(log.contains("Quiet Title"));
}

#[test]
fn stats_works_on_fresh_state() {
    let (_tmp, config) = setup_env();
    let output = run_stow(&config, &["stats"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Tracked files:     0"));
    assert!(stdout.contains("Total uploads:     0"));
}

#[test]
fn export_log_writes_seeded_activity() {
    let (_tmp, config) = setup_env();
    let data_dir = config.parent().unwrap().join("app_data");
    fs::write(
        data_dir.join("activity_log.json"),
        r#"[
  {
    "at": "2024-03-01T12:00:00Z",
    "kind": "upload",
    "title": "File Uploaded: report.pdf",
    "body": "2.0 KB",
    "user": "alice"
  }
]"#,
    )
    .unwrap();

    let dest = config.parent().unwrap().join("activity.txt");
    let output = run_stow(&config, &["export-log", dest.to_str().unwrap()]);
    assert!(output.status.success(), "export-log failed: {:?}", output);

    let text = fs::read_to_string(&dest).unwrap();
    assert!(text.contains("UPLOAD"));
    assert!(text.contains("report.pdf"));
    assert!(text.contains("alice"));
}

#[test]
fn ask_without_assistant_section_fails_cleanly() {
    let (_tmp, config) = setup_env();
    let output = run_stow(&config, &["ask", "what files do I have?"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("assistant"));
}

#[test]
fn rejects_invalid_config() {
    let tmp = TempDir::new().unwrap();
    let config = tmp.path().join("stow.toml");
    fs::write(
        &config,
        r#"[remote]
base_url = ""
api_key = "k"

[storage]
data_dir = "app_data"
"#,
    )
    .unwrap();

    let output = run_stow(&config, &["files"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("base_url"));
}
