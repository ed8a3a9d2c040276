//! Integration tests for configuration layering.
//!
//! Tests the full priority chain: hardcoded defaults < XDG config < project config < CLI args

#![allow(clippy::unwrap_used)] // Test code uses unwrap for brevity
#![allow(deprecated)] // cargo_bin deprecation warning

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn sleepwatch(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("sleepwatch").unwrap();
    cmd.current_dir(home)
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_DATA_HOME", home.join("data"));
    cmd
}

fn write_xdg_config(home: &Path, contents: &str) {
    let dir = home.join("config/sleepwatch");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("config.toml"), contents).unwrap();
}

#[test]
fn test_project_config_sets_models_dir() {
    let home = TempDir::new().unwrap();
    fs::write(
        home.path().join(".sleepwatch.toml"),
        r"
[models]
dir = '/srv/project-models'
",
    )
    .unwrap();

    sleepwatch(home.path())
        .args(["models", "path"])
        .assert()
        .success()
        .stdout(predicate::str::diff("/srv/project-models\n"));
}

#[test]
fn test_cli_overrides_project_config() {
    let home = TempDir::new().unwrap();
    fs::write(
        home.path().join(".sleepwatch.toml"),
        r"
[models]
dir = '/srv/project-models'
",
    )
    .unwrap();

    sleepwatch(home.path())
        .args(["models", "path", "--models-dir", "/srv/cli-models"])
        .assert()
        .success()
        .stdout(predicate::str::diff("/srv/cli-models\n"));
}

#[test]
fn test_xdg_config_applies() {
    let home = TempDir::new().unwrap();
    write_xdg_config(
        home.path(),
        r"
[models]
dir = '/srv/xdg-models'
",
    );

    sleepwatch(home.path())
        .args(["models", "path"])
        .assert()
        .success()
        .stdout(predicate::str::diff("/srv/xdg-models\n"));
}

#[test]
fn test_project_config_overrides_xdg() {
    let home = TempDir::new().unwrap();
    write_xdg_config(
        home.path(),
        r"
[models]
dir = '/srv/xdg-models'
",
    );
    fs::write(
        home.path().join(".sleepwatch.toml"),
        r"
[models]
dir = '/srv/project-models'
",
    )
    .unwrap();

    sleepwatch(home.path())
        .args(["models", "path"])
        .assert()
        .success()
        .stdout(predicate::str::diff("/srv/project-models\n"));
}

#[test]
fn test_project_config_found_in_parent() {
    let home = TempDir::new().unwrap();
    let nested = home.path().join("ward/room-3");
    fs::create_dir_all(&nested).unwrap();
    fs::write(
        home.path().join(".sleepwatch.toml"),
        r"
[storage]
database = 'parent.db'
",
    )
    .unwrap();

    sleepwatch(home.path())
        .current_dir(&nested)
        .arg("analytics")
        .assert()
        .success();

    // Relative paths resolve against the working directory.
    assert!(nested.join("parent.db").exists());
}

#[test]
fn test_config_database_and_cli_override() {
    let home = TempDir::new().unwrap();
    fs::write(
        home.path().join(".sleepwatch.toml"),
        r"
[storage]
database = 'config.db'
",
    )
    .unwrap();

    sleepwatch(home.path())
        .args(["analytics", "--database", "cli.db"])
        .assert()
        .success();

    assert!(home.path().join("cli.db").exists());
    assert!(!home.path().join("config.db").exists());
}

#[test]
fn test_config_base_url_used_by_fetch() {
    let home = TempDir::new().unwrap();
    let models = home.path().join("models");
    fs::create_dir_all(&models).unwrap();
    for name in ["blazeface", "face_mesh", "pose_landmark", "eye_state"] {
        fs::write(models.join(format!("{name}.safetensors")), b"").unwrap();
    }
    fs::write(
        home.path().join(".sleepwatch.toml"),
        r"
[models]
dir = 'models'
base_url = 'http://127.0.0.1:9/models'
",
    )
    .unwrap();

    // The URL requirement is satisfied by config; everything is installed already.
    sleepwatch(home.path())
        .args(["models", "fetch"])
        .assert()
        .success();
}

#[test]
fn test_invalid_value_warns() {
    let home = TempDir::new().unwrap();
    fs::write(
        home.path().join(".sleepwatch.toml"),
        r"
[detection]
lying_down_ratio = -1.0
",
    )
    .unwrap();

    sleepwatch(home.path())
        .args(["models", "path"])
        .assert()
        .success()
        .stderr(predicate::str::contains(
            "warning: detection.lying_down_ratio must be a positive number",
        ));
}

#[test]
fn test_unparseable_config_is_ignored() {
    let home = TempDir::new().unwrap();
    fs::write(home.path().join(".sleepwatch.toml"), "[models\ndir = 'x'").unwrap();

    sleepwatch(home.path())
        .args(["-v", "models", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sleepwatch/models"))
        .stderr(predicate::str::contains("Failed to parse config file"));
}
