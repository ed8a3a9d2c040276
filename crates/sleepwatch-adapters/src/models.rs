//! Model downloading and caching adapter.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use sleepwatch_core::inference::ModelPaths;
use tracing::{debug, info};

/// Model metadata.
#[derive(Debug, Clone)]
pub struct ModelInfo {
    /// Model name/identifier.
    pub name: &'static str,
    /// Filename in the models directory and under the download base URL.
    pub filename: &'static str,
    /// What the model does.
    pub description: &'static str,
}

/// Models the pipeline needs.
pub const MODELS: &[ModelInfo] = &[
    ModelInfo {
        name: "blazeface",
        filename: "blazeface.safetensors",
        description: "face detector",
    },
    ModelInfo {
        name: "face_mesh",
        filename: "face_mesh.safetensors",
        description: "468-point face landmarks",
    },
    ModelInfo {
        name: "pose_landmark",
        filename: "pose_landmark.safetensors",
        description: "body pose landmarks",
    },
    ModelInfo {
        name: "eye_state",
        filename: "eye_state.safetensors",
        description: "open/closed eye classifier",
    },
];

static MODELS_DIR_OVERRIDE: RwLock<Option<PathBuf>> = RwLock::new(None);

/// Overrides the models directory for the rest of the process.
pub fn set_models_dir(dir: impl Into<PathBuf>) {
    let mut guard = MODELS_DIR_OVERRIDE
        .write()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    *guard = Some(dir.into());
}

/// Returns the models directory path.
///
/// Uses the override from [`set_models_dir`] if set, otherwise
/// `XDG_DATA_HOME/sleepwatch/models` or `~/.local/share/sleepwatch/models`.
#[must_use]
pub fn models_dir() -> PathBuf {
    let guard = MODELS_DIR_OVERRIDE
        .read()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    guard.clone().unwrap_or_else(default_models_dir)
}

fn default_models_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sleepwatch")
        .join("models")
}

/// Paths of all four models inside [`models_dir`].
#[must_use]
pub fn model_paths() -> ModelPaths {
    ModelPaths::in_dir(models_dir())
}

/// Lists models with their install status.
#[must_use]
pub fn list_models() -> Vec<(&'static ModelInfo, bool)> {
    let dir = models_dir();
    MODELS
        .iter()
        .map(|m| (m, dir.join(m.filename).exists()))
        .collect()
}

/// Where and how to fetch models.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// URL prefix; each model is fetched from `{base_url}/{filename}`.
    pub base_url: String,
    /// Re-download models that already exist.
    pub force: bool,
    /// Expected SHA-256 digests by model name. Models without an entry are not verified.
    pub checksums: Vec<(String, String)>,
}

impl FetchOptions {
    fn checksum_for(&self, name: &str) -> Option<&str> {
        self.checksums
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, sum)| sum.as_str())
    }
}

/// Progress callback for downloads: `(model_name, bytes_downloaded, total_bytes)`.
pub type ProgressCallback = Box<dyn Fn(&str, u64, Option<u64>) + Send>;

/// Downloads every missing model (or all of them, with `force`).
///
/// Returns the names of the models that were downloaded.
///
/// # Errors
///
/// Returns an error if:
/// - The models directory cannot be created
/// - A model download fails
/// - A model's checksum doesn't match
pub fn fetch_models(
    options: &FetchOptions,
    progress: Option<&ProgressCallback>,
) -> Result<Vec<&'static str>> {
    let dir = models_dir();
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create models directory {}", dir.display()))?;

    let mut fetched = Vec::new();
    for model in MODELS {
        let path = dir.join(model.filename);
        if path.exists() && !options.force {
            debug!("Model {} already exists", model.name);
            continue;
        }
        let url = format!("{}/{}", options.base_url.trim_end_matches('/'), model.filename);
        download_model(model, &url, options.checksum_for(model.name), &path, progress)?;
        fetched.push(model.name);
    }
    Ok(fetched)
}

fn download_model(
    model: &ModelInfo,
    url: &str,
    sha256: Option<&str>,
    path: &Path,
    progress: Option<&ProgressCallback>,
) -> Result<()> {
    info!("Downloading model {} from {url}", model.name);

    let response = reqwest::blocking::get(url)
        .with_context(|| format!("Failed to download {}", model.name))?;
    if !response.status().is_success() {
        anyhow::bail!(
            "Download of {} failed with status: {}",
            model.name,
            response.status()
        );
    }

    let total = response.content_length();
    let bytes = response
        .bytes()
        .with_context(|| format!("Failed to read response for {}", model.name))?;
    if let Some(cb) = progress {
        cb(model.name, bytes.len() as u64, total);
    }

    match sha256 {
        Some(expected) => verify_checksum(model.name, &bytes, expected, path)?,
        None => debug!("No checksum configured for {}, skipping verification", model.name),
    }

    let tmp = path.with_extension("safetensors.part");
    fs::write(&tmp, &bytes).with_context(|| format!("Failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("Failed to move {} into place", model.name))?;

    info!("Downloaded {} ({} bytes)", model.name, bytes.len());
    Ok(())
}

fn verify_checksum(name: &str, bytes: &[u8], expected: &str, path: &Path) -> Result<()> {
    let hash = format!("{:x}", Sha256::digest(bytes));
    if !hash.eq_ignore_ascii_case(expected) {
        anyhow::bail!(
            "Checksum mismatch for {name}: expected {expected}, got {hash}. \
             Try deleting {} and re-running to download a fresh copy.",
            path.display()
        );
    }
    Ok(())
}
