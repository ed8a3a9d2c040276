//! ML inference engine using Candle.
//!
//! Provides model loading and inference for:
//! - `BlazeFace` (face detection) feeding a 468-point face-mesh regressor
//! - a BlazePose-style body landmark regressor
//! - the open/closed eye-state classifier

mod blazeface;
mod blocks;
mod device;
mod eye_state;
mod face_mesh;
mod loader;
mod pose_landmark;
mod utils;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::pipeline::VisionModels;

pub use blazeface::{BlazeFace, FaceDetection};
pub use device::{select_device, DevicePreference};
pub use eye_state::{preprocess_eye, CandleEyeClassifier, EyePreprocessing, EyeStateNet};
pub use face_mesh::{CandleFaceLandmarker, FaceMesh, MESH_INPUT_SIZE, ROI_SCALE};
pub use loader::load_safetensors;
pub use pose_landmark::{CandlePoseLandmarker, PoseLandmarkNet, BODY_LANDMARKS, POSE_INPUT_SIZE};
pub use utils::sigmoid;

/// Locations of the four weight files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPaths {
    /// `BlazeFace` detector.
    pub blazeface: PathBuf,
    /// Face-mesh regressor.
    pub face_mesh: PathBuf,
    /// Pose landmark regressor.
    pub pose_landmark: PathBuf,
    /// Eye-state classifier.
    pub eye_state: PathBuf,
}

impl ModelPaths {
    /// Standard file names inside `dir`.
    #[must_use]
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            blazeface: dir.join("blazeface.safetensors"),
            face_mesh: dir.join("face_mesh.safetensors"),
            pose_landmark: dir.join("pose_landmark.safetensors"),
            eye_state: dir.join("eye_state.safetensors"),
        }
    }

    /// Paths that do not exist on disk.
    #[must_use]
    pub fn missing(&self) -> Vec<&Path> {
        [
            &self.blazeface,
            &self.face_mesh,
            &self.pose_landmark,
            &self.eye_state,
        ]
        .into_iter()
        .filter(|p| !p.exists())
        .map(PathBuf::as_path)
        .collect()
    }
}

/// Inference thresholds and device choice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelSettings {
    /// Minimum `BlazeFace` score for a face to count.
    pub min_face_confidence: f32,
    /// Minimum pose-flag probability for a body to count.
    pub min_pose_confidence: f32,
    /// Compute device.
    pub device: DevicePreference,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            min_face_confidence: 0.5,
            min_pose_confidence: 0.5,
            device: DevicePreference::Auto,
        }
    }
}

/// Loads all three capabilities from `paths`.
///
/// # Errors
///
/// Returns an error if any weight file is missing or does not match its network.
pub fn load_vision_models(paths: &ModelPaths, settings: &ModelSettings) -> Result<VisionModels> {
    let device = select_device(settings.device);

    info!("Loading BlazeFace from {}", paths.blazeface.display());
    let detector = BlazeFace::new(load_safetensors(&paths.blazeface, &device)?)
        .context("Failed to create BlazeFace model")?;

    info!("Loading face mesh from {}", paths.face_mesh.display());
    let mesh = FaceMesh::new(load_safetensors(&paths.face_mesh, &device)?)
        .context("Failed to create face-mesh model")?;

    info!("Loading pose landmarks from {}", paths.pose_landmark.display());
    let pose = PoseLandmarkNet::new(load_safetensors(&paths.pose_landmark, &device)?)
        .context("Failed to create pose landmark model")?;

    info!("Loading eye-state classifier from {}", paths.eye_state.display());
    let eyes = EyeStateNet::new(load_safetensors(&paths.eye_state, &device)?)
        .context("Failed to create eye-state classifier")?;

    Ok(VisionModels::new(
        Arc::new(CandleFaceLandmarker::new(
            detector,
            mesh,
            settings.min_face_confidence,
        )),
        Arc::new(CandlePoseLandmarker::new(pose, settings.min_pose_confidence)),
        Arc::new(CandleEyeClassifier::new(eyes, device)),
    ))
}
