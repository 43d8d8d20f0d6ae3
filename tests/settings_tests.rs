//! Settings store tests
//!
//! Tests loading, defaults, read-modify-write saves and validation

mod common;

use std::fs;
use std::path::PathBuf;

use hostprobe::settings::{Settings, SettingsStore};
use hostprobe::{Error, ErrorCode};
use tempfile::TempDir;

/// Test fixture for settings files
struct SettingsFixture {
    _temp_dir: TempDir,
    path: PathBuf,
}

impl SettingsFixture {
    fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config").join("settings.toml");
        Self {
            _temp_dir: temp_dir,
            path,
        }
    }

    fn write(&self, content: &str) {
        fs::create_dir_all(self.path.parent().unwrap()).unwrap();
        fs::write(&self.path, content).unwrap();
    }

    fn read_table(&self) -> toml::Table {
        fs::read_to_string(&self.path).unwrap().parse().unwrap()
    }
}

// ─────────────────────────────────────────────────────────────────
// Loading
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_missing_file_is_created_with_defaults() {
    let fixture = SettingsFixture::new();
    assert!(!fixture.path.exists());

    let store = SettingsStore::load(&fixture.path).unwrap();

    assert!(fixture.path.exists());
    assert_eq!(store.cpu_iterations(), 10_000_000);
    assert_eq!(store.gpu_vendor(), "auto");
    assert_eq!(store.json_path(), "results.json");

    let table = fixture.read_table();
    assert_eq!(table["benchmark"]["cpu_iterations"].as_integer(), Some(10_000_000));
    assert_eq!(table["gpu"]["vendor"].as_str(), Some("auto"));
    assert_eq!(table["output"]["json_path"].as_str(), Some("results.json"));
}

#[test]
fn test_string_values_and_foreign_sections() {
    let store = SettingsStore::load(common::legacy_settings_fixture()).unwrap();

    assert_eq!(store.cpu_iterations(), 2_000_000);
    assert_eq!(store.gpu_iterations(), 500);
    assert_eq!(store.polling_interval(), 0.5);
    assert!(!store.cpu_monitor_usage());
    assert!(store.gpu_enable());
    assert_eq!(store.gpu_vendor(), "nvidia");
    assert_eq!(store.json_path(), "bench/results.json");
    // Absent keys take their defaults
    assert!(!store.log_to_file());
    assert_eq!(store.settings().logging.level, "info");
}

#[test]
fn test_partial_file_uses_defaults() {
    let fixture = SettingsFixture::new();
    fixture.write("[benchmark]\ncpu_iterations = 42\n");

    let store = SettingsStore::load(&fixture.path).unwrap();

    assert_eq!(store.cpu_iterations(), 42);
    assert_eq!(store.gpu_iterations(), 10_000_000);
    assert!(store.gpu_enable());
}

#[test]
fn test_unparseable_file_is_an_error() {
    let fixture = SettingsFixture::new();
    fixture.write("[benchmark\ncpu_iterations = ");

    let err = SettingsStore::load(&fixture.path).unwrap_err();
    assert!(matches!(err, Error::SettingsParse { .. }));
    assert_eq!(err.code(), ErrorCode::SettingsParse);
}

// ─────────────────────────────────────────────────────────────────
// Saving
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_defaults_round_trip() {
    let fixture = SettingsFixture::new();
    let store = SettingsStore::load(&fixture.path).unwrap();
    store.save().unwrap();

    let reloaded = SettingsStore::load(&fixture.path).unwrap();
    assert_eq!(reloaded.settings(), &Settings::default());
}

#[test]
fn test_setter_round_trip() {
    let fixture = SettingsFixture::new();
    let mut store = SettingsStore::load(&fixture.path).unwrap();

    store.set_cpu_iterations(1234);
    store.set_polling_interval(0.25);
    store.set_gpu_vendor("amd");
    store.set_log_to_file(true);
    store.save().unwrap();

    let reloaded = SettingsStore::load(&fixture.path).unwrap();
    assert_eq!(reloaded.cpu_iterations(), 1234);
    assert_eq!(reloaded.polling_interval(), 0.25);
    assert_eq!(reloaded.gpu_vendor(), "amd");
    assert!(reloaded.log_to_file());
}

#[test]
fn test_save_keeps_unrelated_keys() {
    let fixture = SettingsFixture::new();
    fixture.write(
        r#"
[benchmark]
cpu_iterations = 10000000
comment = "do not touch"

[profile]
owner = "lab-3"
runs = 12
"#,
    );

    let mut store = SettingsStore::load(&fixture.path).unwrap();
    store.set_gpu_enable(false);
    store.save().unwrap();

    let table = fixture.read_table();
    assert_eq!(table["gpu"]["enable"].as_bool(), Some(false));
    assert_eq!(table["benchmark"]["comment"].as_str(), Some("do not touch"));
    assert_eq!(table["profile"]["owner"].as_str(), Some("lab-3"));
    assert_eq!(table["profile"]["runs"].as_integer(), Some(12));
}

#[test]
fn test_save_changes_only_the_edited_line() {
    let fixture = SettingsFixture::new();
    let before = r#"# bench box in lab 3
[benchmark]
cpu_iterations = "2000000"
gpu_iterations = "lots"   # fixed later

[gpu]
vendor = "nvidia"

[profile]
owner = 'lab-3'
"#;
    fixture.write(before);

    let mut store = SettingsStore::load(&fixture.path).unwrap();
    assert_eq!(store.gpu_iterations(), 10_000_000);
    store.set_gpu_vendor("amd");
    store.save().unwrap();

    let after = fs::read_to_string(&fixture.path).unwrap();
    assert_eq!(after, before.replace(r#"vendor = "nvidia""#, r#"vendor = "amd""#));

    let reloaded = SettingsStore::load(&fixture.path).unwrap();
    assert_eq!(reloaded.gpu_vendor(), "amd");
    assert_eq!(reloaded.cpu_iterations(), 2_000_000);
}

#[test]
fn test_save_without_changes_leaves_file_untouched() {
    let fixture = SettingsFixture::new();
    let before = "[benchmark]\ncpu_iterations = \"2000000\"\n\n[profile]\nowner = 'lab-3'\n";
    fixture.write(before);

    let store = SettingsStore::load(&fixture.path).unwrap();
    store.save().unwrap();

    assert_eq!(fs::read_to_string(&fixture.path).unwrap(), before);
}

#[test]
fn test_save_rejects_oversized_iterations() {
    let fixture = SettingsFixture::new();
    let mut store = SettingsStore::load(&fixture.path).unwrap();
    store.set_cpu_iterations(u64::MAX);

    let err = store.save().unwrap_err();
    assert_eq!(err.code(), ErrorCode::SettingsValidation);

    let reloaded = SettingsStore::load(&fixture.path).unwrap();
    assert_eq!(reloaded.cpu_iterations(), 10_000_000);
}

#[test]
fn test_save_rereads_file_before_writing() {
    let fixture = SettingsFixture::new();
    let store = SettingsStore::load(&fixture.path).unwrap();

    // Another writer adds a section after our load
    let mut content = fs::read_to_string(&fixture.path).unwrap();
    content.push_str("\n[notes]\nlast_run = \"yesterday\"\n");
    fs::write(&fixture.path, content).unwrap();

    store.save().unwrap();

    let table = fixture.read_table();
    assert_eq!(table["notes"]["last_run"].as_str(), Some("yesterday"));
}

#[test]
fn test_save_recreates_missing_directory() {
    let fixture = SettingsFixture::new();
    let store = SettingsStore::load(&fixture.path).unwrap();
    fs::remove_dir_all(fixture.path.parent().unwrap()).unwrap();

    store.save().unwrap();

    assert!(fixture.path.exists());
}

#[test]
fn test_reset_restores_defaults() {
    let fixture = SettingsFixture::new();
    fixture.write("[benchmark]\ncpu_iterations = 7\n");

    let store = SettingsStore::reset(&fixture.path).unwrap();
    assert_eq!(store.cpu_iterations(), 10_000_000);

    let reloaded = SettingsStore::load(&fixture.path).unwrap();
    assert_eq!(reloaded.settings(), &Settings::default());
}

// ─────────────────────────────────────────────────────────────────
// CLI
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_cli_set_preserves_foreign_keys() {
    let fixture = SettingsFixture::new();
    fixture.write("[profile]\nowner = \"lab-3\"\n");

    assert_cmd::Command::cargo_bin("hostprobe")
        .unwrap()
        .args(["config", "set", "benchmark.cpu_iterations", "5000"])
        .arg("--settings")
        .arg(&fixture.path)
        .assert()
        .success();

    let table = fixture.read_table();
    assert_eq!(table["benchmark"]["cpu_iterations"].as_integer(), Some(5000));
    assert_eq!(table["profile"]["owner"].as_str(), Some("lab-3"));
}

#[test]
fn test_cli_validate_rejects_zero_iterations() {
    let fixture = SettingsFixture::new();
    fixture.write("[benchmark]\ncpu_iterations = 0\n");

    assert_cmd::Command::cargo_bin("hostprobe")
        .unwrap()
        .args(["config", "validate"])
        .arg("--settings")
        .arg(&fixture.path)
        .assert()
        .failure()
        .code(10);
}
