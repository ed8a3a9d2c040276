//! Configuration file support for sleepwatch.
//!
//! Supports TOML configuration from:
//! - XDG config: `~/.config/sleepwatch/config.toml` (lowest priority)
//! - Project-local: `.sleepwatch.toml` (searched up directory tree)
//! - CLI flags (highest priority, merged on top by the commands)

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use sleepwatch_adapters::http::DEFAULT_CORS_ORIGIN;
use sleepwatch_adapters::ServerSettings;
use sleepwatch_core::inference::{DevicePreference, ModelSettings};
use sleepwatch_core::pipeline::{PipelineConfig, DEFAULT_LYING_DOWN_RATIO, EYE_MARGIN_PX};
use tracing::{debug, info};

/// Hardcoded defaults for values the config leaves unset.
pub mod defaults {
    pub const HOST: &str = "127.0.0.1";
    pub const PORT: u16 = 8000;
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;
    pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
    pub const MIN_FACE_CONFIDENCE: f32 = 0.5;
    pub const MIN_POSE_CONFIDENCE: f32 = 0.5;
    pub const DATABASE_FILE: &str = "sleepwatch.db";
}

/// Top-level configuration structure.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Pipeline and model thresholds.
    pub detection: DetectionConfig,
    /// Model settings.
    pub models: ModelsConfig,
    /// Outcome storage settings.
    pub storage: StorageConfig,
}

/// HTTP server configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: Option<String>,
    /// Bind port.
    pub port: Option<u16>,
    /// Origins allowed by CORS.
    pub cors_origins: Option<Vec<String>>,
    /// Per-prediction timeout in seconds.
    pub request_timeout_secs: Option<u64>,
    /// Largest accepted upload.
    pub max_upload_bytes: Option<usize>,
}

/// Detection thresholds.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Pixels added around the eye landmarks before cropping.
    pub eye_margin: Option<u32>,
    /// Horizontal/vertical torso ratio above which a body is lying down.
    pub lying_down_ratio: Option<f32>,
    /// Minimum face detection confidence.
    pub min_face_confidence: Option<f32>,
    /// Minimum body presence confidence.
    pub min_pose_confidence: Option<f32>,
}

/// Model configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Custom models directory path.
    pub dir: Option<PathBuf>,
    /// URL prefix `models fetch` downloads from.
    pub base_url: Option<String>,
    /// `auto` or `cpu`.
    pub device: Option<DevicePreference>,
    /// Expected SHA-256 per model name.
    pub checksums: HashMap<String, String>,
}

/// Storage configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database path.
    pub database: Option<PathBuf>,
}

impl AppConfig {
    /// Load configuration from XDG and project-local files.
    ///
    /// Priority (lowest to highest):
    /// 1. XDG config: `~/.config/sleepwatch/config.toml`
    /// 2. Project-local: `.sleepwatch.toml` (searched up from cwd)
    ///
    /// Missing files are silently ignored. Invalid values are reported as warnings.
    pub fn load() -> Self {
        let mut config = Self::default();

        if let Some(xdg_path) = xdg_config_path() {
            if xdg_path.exists() {
                info!("Loading XDG config: {}", xdg_path.display());
                if let Some(xdg_config) = load_file(&xdg_path) {
                    config = xdg_config;
                }
            } else {
                debug!("XDG config not found: {}", xdg_path.display());
            }
        }

        if let Some(project_path) = find_project_config() {
            info!("Loading project config: {}", project_path.display());
            if let Some(project_config) = load_file(&project_path) {
                config.merge(project_config);
            }
        }

        if let Err(e) = config.validate() {
            eprintln!("warning: {e}");
        }

        config
    }

    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), String> {
        let confidences = [
            ("detection.min_face_confidence", self.detection.min_face_confidence),
            ("detection.min_pose_confidence", self.detection.min_pose_confidence),
        ];
        for (key, value) in confidences {
            if let Some(t) = value {
                if !(0.0..=1.0).contains(&t) {
                    return Err(format!("{key} must be 0.0-1.0, got {t}"));
                }
            }
        }

        if let Some(r) = self.detection.lying_down_ratio {
            if !r.is_finite() || r <= 0.0 {
                return Err(format!(
                    "detection.lying_down_ratio must be a positive number, got {r}"
                ));
            }
        }

        if self.server.port == Some(0) {
            return Err("server.port must be 1-65535, got 0".to_string());
        }
        if self.server.request_timeout_secs == Some(0) {
            return Err("server.request_timeout_secs must be at least 1".to_string());
        }
        if self.server.max_upload_bytes == Some(0) {
            return Err("server.max_upload_bytes must be at least 1".to_string());
        }

        if let Some(ref url) = self.models.base_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(format!(
                    "models.base_url must start with http:// or https://, got '{url}'"
                ));
            }
        }

        Ok(())
    }

    /// Merge another config into this one.
    /// Values from `other` override values in `self` when present.
    pub fn merge(&mut self, other: Self) {
        // Server
        self.server.host = other.server.host.or_else(|| self.server.host.take());
        self.server.port = other.server.port.or(self.server.port);
        self.server.cors_origins = other
            .server
            .cors_origins
            .or_else(|| self.server.cors_origins.take());
        self.server.request_timeout_secs = other
            .server
            .request_timeout_secs
            .or(self.server.request_timeout_secs);
        self.server.max_upload_bytes = other
            .server
            .max_upload_bytes
            .or(self.server.max_upload_bytes);

        // Detection
        self.detection.eye_margin = other.detection.eye_margin.or(self.detection.eye_margin);
        self.detection.lying_down_ratio = other
            .detection
            .lying_down_ratio
            .or(self.detection.lying_down_ratio);
        self.detection.min_face_confidence = other
            .detection
            .min_face_confidence
            .or(self.detection.min_face_confidence);
        self.detection.min_pose_confidence = other
            .detection
            .min_pose_confidence
            .or(self.detection.min_pose_confidence);

        // Models
        self.models.dir = other.models.dir.or_else(|| self.models.dir.take());
        self.models.base_url = other.models.base_url.or_else(|| self.models.base_url.take());
        self.models.device = other.models.device.or(self.models.device);
        self.models.checksums.extend(other.models.checksums);

        // Storage
        self.storage.database = other
            .storage
            .database
            .or_else(|| self.storage.database.take());
    }

    /// Pipeline thresholds with hardcoded fallbacks.
    #[must_use]
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig::default()
            .with_eye_margin(self.detection.eye_margin.unwrap_or(EYE_MARGIN_PX))
            .with_lying_down_ratio(
                self.detection
                    .lying_down_ratio
                    .unwrap_or(DEFAULT_LYING_DOWN_RATIO),
            )
    }

    /// Model thresholds and device with hardcoded fallbacks.
    #[must_use]
    pub fn model_settings(&self) -> ModelSettings {
        ModelSettings {
            min_face_confidence: self
                .detection
                .min_face_confidence
                .unwrap_or(defaults::MIN_FACE_CONFIDENCE),
            min_pose_confidence: self
                .detection
                .min_pose_confidence
                .unwrap_or(defaults::MIN_POSE_CONFIDENCE),
            device: self.models.device.unwrap_or_default(),
        }
    }

    /// HTTP settings with hardcoded fallbacks.
    #[must_use]
    pub fn server_settings(&self) -> ServerSettings {
        ServerSettings {
            cors_origins: self
                .server
                .cors_origins
                .clone()
                .unwrap_or_else(|| vec![DEFAULT_CORS_ORIGIN.to_string()]),
            request_timeout: Duration::from_secs(
                self.server
                    .request_timeout_secs
                    .unwrap_or(defaults::REQUEST_TIMEOUT_SECS),
            ),
            max_upload_bytes: self
                .server
                .max_upload_bytes
                .unwrap_or(defaults::MAX_UPLOAD_BYTES),
        }
    }

    /// `host:port` to bind.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!(
            "{}:{}",
            self.server.host.as_deref().unwrap_or(defaults::HOST),
            self.server.port.unwrap_or(defaults::PORT)
        )
    }

    /// Database path, defaulting to the XDG data directory.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage.database.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("sleepwatch")
                .join(defaults::DATABASE_FILE)
        })
    }
}

/// Get the XDG config file path.
fn xdg_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("sleepwatch").join("config.toml"))
}

/// Find project-local config by searching up from current directory.
fn find_project_config() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    find_config_in_parents(&cwd)
}

/// Search for `.sleepwatch.toml` in the given directory and its parents.
fn find_config_in_parents(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);

    while let Some(dir) = current {
        let config_path = dir.join(".sleepwatch.toml");
        if config_path.exists() {
            return Some(config_path);
        }
        current = dir.parent();
    }

    None
}

/// Load and parse a TOML config file.
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("Failed to read config file {}: {}", path.display(), e);
            return None;
        }
    };

    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!("Failed to parse config file {}: {}", path.display(), e);
            None
        }
    }
}
