// crates/separator/src/lib.rs
//! Audio domain and model-capability boundary for the stems service.
//!
//! The [`Separator`] trait is the seam between job orchestration and the
//! actual source-separation model: backends declare their stem set and sample
//! rate and turn one normalized stereo mix into one buffer per stem. The
//! orchestration layer never sees anything model-specific.

use std::str::FromStr;
use std::sync::Arc;

pub mod audio;
pub mod error;
pub mod normalize;
pub mod passthrough;

pub use audio::{DecodedAudio, StereoAudio};
pub use error::SeparatorError;
pub use passthrough::PassthroughSeparator;

/// Stem set of the standard four-source models, also used as the advertised
/// set when no backend is loaded.
pub const DEFAULT_STEMS: [&str; 4] = ["vocals", "drums", "bass", "other"];

/// Sample rate the bundled backends operate at (the hybrid-transformer
/// separation models are all trained at 44.1 kHz).
pub const MODEL_SAMPLE_RATE: u32 = 44100;

/// Input formats the decoder accepts, as advertised by the service.
pub const SUPPORTED_FORMATS: [&str; 4] = ["wav", "mp3", "flac", "ogg"];

/// Compute device a backend runs on. Carried as startup configuration and
/// surfaced in health/info responses; the passthrough backend ignores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    Cpu,
    Cuda,
}

impl FromStr for Device {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cpu" => Ok(Device::Cpu),
            "cuda" => Ok(Device::Cuda),
            other => Err(format!("unknown device: {other}")),
        }
    }
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
            Device::Cuda => write!(f, "cuda"),
        }
    }
}

/// A loaded source-separation model.
///
/// Implementations must be safe to invoke from any number of concurrent
/// workers; a backend that cannot tolerate concurrent inference has to
/// serialize calls internally.
pub trait Separator: Send + Sync {
    /// Model identifier, as surfaced in health/info responses.
    fn model(&self) -> &str;

    /// Sample rate the model expects its input at.
    fn sample_rate(&self) -> u32;

    /// Stem names this model produces, in output order.
    fn stems(&self) -> &[String];

    /// Separate one normalized stereo mix into one buffer per stem, in
    /// [`Separator::stems`] order.
    fn separate(&self, mix: &StereoAudio) -> Result<Vec<StereoAudio>, SeparatorError>;
}

impl std::fmt::Debug for dyn Separator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Separator")
            .field("model", &self.model())
            .field("sample_rate", &self.sample_rate())
            .field("stems", &self.stems())
            .finish()
    }
}

/// Load a separation backend by model name.
///
/// Inference backends register here; `passthrough` is the only bundled one.
pub fn load(model: &str, device: Device) -> Result<Arc<dyn Separator>, SeparatorError> {
    tracing::info!(model, device = %device, "loading separation backend");
    match model {
        "passthrough" => Ok(Arc::new(PassthroughSeparator::new())),
        other => Err(SeparatorError::UnknownModel(other.to_string())),
    }
}
