//! CLI argument validation tests.
//!
//! Tests command-line parsing, exit codes and the commands that run without models.

#![allow(clippy::unwrap_used)]
#![allow(deprecated)] // cargo_bin deprecation

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use sleepwatch_test_support::SyntheticFrame;
use tempfile::TempDir;

/// Command isolated from the user's config and data directories.
fn sleepwatch(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("sleepwatch").unwrap();
    cmd.current_dir(home)
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_DATA_HOME", home.join("data"));
    cmd
}

// === Parsing ===

#[test]
fn test_help_lists_subcommands() {
    let home = TempDir::new().unwrap();
    sleepwatch(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("serve")
                .and(predicate::str::contains("predict"))
                .and(predicate::str::contains("analytics"))
                .and(predicate::str::contains("models")),
        );
}

#[test]
fn test_missing_subcommand_is_usage_error() {
    let home = TempDir::new().unwrap();
    sleepwatch(home.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_invalid_log_format_rejected() {
    let home = TempDir::new().unwrap();
    sleepwatch(home.path())
        .args(["--log-format", "xml", "models", "path"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("xml"));
}

#[test]
fn test_json_log_format_accepted() {
    let home = TempDir::new().unwrap();
    sleepwatch(home.path())
        .args(["--log-format", "json", "-v", "models", "path"])
        .assert()
        .success();
}

#[test]
fn test_lying_down_ratio_validated() {
    let home = TempDir::new().unwrap();
    sleepwatch(home.path())
        .args(["predict", "frame.png", "--lying-down-ratio", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not a positive number"));
}

// === predict ===

#[test]
fn test_predict_missing_file() {
    let home = TempDir::new().unwrap();
    sleepwatch(home.path())
        .args(["predict", "/nonexistent/frame.jpg"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Failed to read"));
}

#[test]
fn test_predict_rejects_unsupported_image() {
    let home = TempDir::new().unwrap();
    let image = home.path().join("frame.gif");
    fs::write(&image, SyntheticFrame::gif_bytes()).unwrap();

    // Rejected before any model is needed.
    sleepwatch(home.path())
        .arg("predict")
        .arg(&image)
        .assert()
        .code(1)
        .stdout(predicate::str::diff("{\"detail\":\"Invalid image type\"}\n"));
}

#[test]
fn test_predict_without_models() {
    let home = TempDir::new().unwrap();
    let image = home.path().join("frame.png");
    fs::write(&image, SyntheticFrame::png_bytes(64, 48)).unwrap();

    sleepwatch(home.path())
        .arg("predict")
        .arg(&image)
        .arg("--models-dir")
        .arg(home.path().join("empty-models"))
        .assert()
        .code(2)
        .stderr(
            predicate::str::contains("Missing model files")
                .and(predicate::str::contains("sleepwatch models fetch")),
        );
}

// === analytics ===

#[test]
fn test_analytics_on_empty_database() {
    let home = TempDir::new().unwrap();
    let db = home.path().join("outcomes.db");

    sleepwatch(home.path())
        .arg("analytics")
        .arg("--database")
        .arg(&db)
        .assert()
        .success()
        .stdout(predicate::str::diff("{\"analytics\":[]}\n"));

    assert!(db.exists(), "database should be created");
}

#[test]
fn test_analytics_pretty() {
    let home = TempDir::new().unwrap();

    sleepwatch(home.path())
        .args(["analytics", "--pretty", "--database", "outcomes.db"])
        .assert()
        .success()
        .stdout(predicate::str::diff("{\n  \"analytics\": []\n}\n"));
}

#[test]
fn test_analytics_default_database_in_data_dir() {
    let home = TempDir::new().unwrap();

    sleepwatch(home.path()).arg("analytics").assert().success();

    assert!(home
        .path()
        .join("data/sleepwatch/sleepwatch.db")
        .exists());
}

#[test]
fn test_analytics_unreadable_database() {
    let home = TempDir::new().unwrap();
    let db = home.path().join("garbage.db");
    fs::write(&db, vec![b'x'; 4096]).unwrap();

    sleepwatch(home.path())
        .arg("analytics")
        .arg("--database")
        .arg(&db)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("error:"));
}

// === models ===

#[test]
fn test_models_path_default() {
    let home = TempDir::new().unwrap();
    sleepwatch(home.path())
        .args(["models", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sleepwatch/models"));
}

#[test]
fn test_models_path_flag() {
    let home = TempDir::new().unwrap();
    sleepwatch(home.path())
        .args(["models", "path", "--models-dir", "/opt/sleepwatch-models"])
        .assert()
        .success()
        .stdout(predicate::str::diff("/opt/sleepwatch-models\n"));
}

#[test]
fn test_models_list_none_installed() {
    let home = TempDir::new().unwrap();
    sleepwatch(home.path())
        .args(["models", "list"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("0/4 models installed")
                .and(predicate::str::contains("eye_state.safetensors")),
        );
}

#[test]
fn test_models_list_counts_installed() {
    let home = TempDir::new().unwrap();
    let models = home.path().join("models");
    fs::create_dir_all(&models).unwrap();
    fs::write(models.join("blazeface.safetensors"), b"").unwrap();
    fs::write(models.join("eye_state.safetensors"), b"").unwrap();

    sleepwatch(home.path())
        .args(["models", "list", "--models-dir"])
        .arg(&models)
        .assert()
        .success()
        .stdout(predicate::str::contains("2/4 models installed"));
}

#[test]
fn test_models_fetch_requires_url() {
    let home = TempDir::new().unwrap();
    sleepwatch(home.path())
        .args(["models", "fetch"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("base_url"));
}

#[test]
fn test_models_fetch_skips_installed() {
    let home = TempDir::new().unwrap();
    let models = home.path().join("models");
    fs::create_dir_all(&models).unwrap();
    for name in ["blazeface", "face_mesh", "pose_landmark", "eye_state"] {
        fs::write(models.join(format!("{name}.safetensors")), b"").unwrap();
    }

    // Nothing to download, so the unreachable URL is never contacted.
    sleepwatch(home.path())
        .args(["models", "fetch", "--base-url", "http://127.0.0.1:9/models", "--models-dir"])
        .arg(&models)
        .assert()
        .success();
}
