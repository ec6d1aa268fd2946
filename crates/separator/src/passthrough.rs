// crates/separator/src/passthrough.rs
//! Passthrough separation backend.
//!
//! Writes the normalized mix unchanged to every declared stem. It performs no
//! actual separation, but exercises the full decode → normalize → separate →
//! encode pipeline, which makes it the backend of choice for development and
//! for environments without an inference engine.

use crate::audio::StereoAudio;
use crate::error::SeparatorError;
use crate::{Separator, DEFAULT_STEMS, MODEL_SAMPLE_RATE};

pub struct PassthroughSeparator {
    stems: Vec<String>,
}

impl PassthroughSeparator {
    pub fn new() -> Self {
        Self::with_stems(DEFAULT_STEMS.iter().map(|s| s.to_string()).collect())
    }

    /// Declare a custom stem set. Useful in tests and for mimicking
    /// six-stem model variants.
    pub fn with_stems(stems: Vec<String>) -> Self {
        Self { stems }
    }
}

impl Default for PassthroughSeparator {
    fn default() -> Self {
        Self::new()
    }
}

impl Separator for PassthroughSeparator {
    fn model(&self) -> &str {
        "passthrough"
    }

    fn sample_rate(&self) -> u32 {
        MODEL_SAMPLE_RATE
    }

    fn stems(&self) -> &[String] {
        &self.stems
    }

    fn separate(&self, mix: &StereoAudio) -> Result<Vec<StereoAudio>, SeparatorError> {
        if mix.is_empty() {
            return Err(SeparatorError::Backend("empty input mix".into()));
        }
        Ok(vec![mix.clone(); self.stems.len()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_one_buffer_per_declared_stem() {
        let sep = PassthroughSeparator::new();
        let mix = StereoAudio {
            left: vec![0.1; 64],
            right: vec![0.2; 64],
            sample_rate: MODEL_SAMPLE_RATE,
        };
        let out = sep.separate(&mix).unwrap();
        assert_eq!(out.len(), sep.stems().len());
        assert!(out.iter().all(|s| s == &mix));
    }

    #[test]
    fn empty_mix_is_rejected() {
        let sep = PassthroughSeparator::new();
        let mix = StereoAudio {
            left: vec![],
            right: vec![],
            sample_rate: MODEL_SAMPLE_RATE,
        };
        assert!(sep.separate(&mix).is_err());
    }

    #[test]
    fn custom_stem_set_is_honored() {
        let sep = PassthroughSeparator::with_stems(vec!["vocals".into(), "karaoke".into()]);
        assert_eq!(sep.stems(), ["vocals".to_string(), "karaoke".to_string()]);
    }
}
