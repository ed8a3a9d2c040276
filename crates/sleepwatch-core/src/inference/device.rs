//! Device selection for inference.

use candle_core::Device;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Which compute device the models should run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DevicePreference {
    /// Metal or CUDA when compiled in and available, CPU otherwise.
    #[default]
    Auto,
    /// Always the CPU.
    Cpu,
}

/// Returns the device for `preference`.
///
/// With `Auto`, uses Metal (macOS) or CUDA when the matching feature is
/// enabled and a device is present, falling back to CPU.
#[must_use]
pub fn select_device(preference: DevicePreference) -> Device {
    if preference == DevicePreference::Cpu {
        info!("Using CPU for inference (requested)");
        return Device::Cpu;
    }

    #[cfg(feature = "metal")]
    {
        if let Ok(device) = Device::new_metal(0) {
            info!("Using Metal device for inference");
            return device;
        }
    }

    #[cfg(feature = "cuda")]
    {
        if let Ok(device) = Device::new_cuda(0) {
            info!("Using CUDA device for inference");
            return device;
        }
    }

    info!("Using CPU for inference");
    Device::Cpu
}
