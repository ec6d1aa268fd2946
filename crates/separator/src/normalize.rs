// crates/separator/src/normalize.rs
//! Coerce decoded audio into the layout a separation backend expects:
//! exactly two channels at the backend's sample rate.
//!
//! The channel policy is deliberately lossy: mono is duplicated to stereo and
//! anything beyond two channels is truncated to the first two.

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

use crate::audio::{DecodedAudio, StereoAudio};
use crate::error::SeparatorError;

/// Coerce an arbitrary channel layout to stereo.
pub fn to_stereo(decoded: DecodedAudio) -> Result<StereoAudio, SeparatorError> {
    let sample_rate = decoded.sample_rate;
    let mut channels = decoded.channels;
    match channels.len() {
        0 => Err(SeparatorError::Decode("decoded audio has no channels".into())),
        1 => {
            let left = channels.pop().unwrap_or_default();
            let right = left.clone();
            Ok(StereoAudio {
                left,
                right,
                sample_rate,
            })
        }
        n => {
            if n > 2 {
                tracing::debug!(channels = n, "truncating to the first two channels");
            }
            let mut it = channels.into_iter();
            let left = it.next().unwrap_or_default();
            let right = it.next().unwrap_or_default();
            Ok(StereoAudio {
                left,
                right,
                sample_rate,
            })
        }
    }
}

/// Resample stereo audio to `to_rate`. Returns the input unchanged if the
/// rates already match.
pub fn resample(audio: StereoAudio, to_rate: u32) -> Result<StereoAudio, SeparatorError> {
    if audio.sample_rate == to_rate || audio.is_empty() {
        return Ok(StereoAudio {
            sample_rate: to_rate,
            ..audio
        });
    }
    let from_rate = audio.sample_rate;
    Ok(StereoAudio {
        left: resample_channel(&audio.left, from_rate, to_rate)?,
        right: resample_channel(&audio.right, from_rate, to_rate)?,
        sample_rate: to_rate,
    })
}

/// Full normalization pipeline: channel coercion, then resampling.
pub fn normalize(decoded: DecodedAudio, target_rate: u32) -> Result<StereoAudio, SeparatorError> {
    resample(to_stereo(decoded)?, target_rate)
}

/// Sinc-interpolated resampling of a single channel.
fn resample_channel(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>, SeparatorError> {
    let ratio = to_rate as f64 / from_rate as f64;
    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let chunk_size = 1024;
    let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, chunk_size, 1)
        .map_err(|e| SeparatorError::Resample(format!("failed to create resampler: {e}")))?;

    let mut output = Vec::with_capacity((samples.len() as f64 * ratio).ceil() as usize + chunk_size);

    let mut chunks = samples.chunks_exact(chunk_size);
    for chunk in &mut chunks {
        let result = resampler
            .process(&[chunk], None)
            .map_err(|e| SeparatorError::Resample(e.to_string()))?;
        output.extend_from_slice(&result[0]);
    }

    // Feed the tail and flush the resampler's internal delay line.
    let remainder = chunks.remainder();
    let result = if remainder.is_empty() {
        resampler.process_partial(None::<&[&[f32]]>, None)
    } else {
        resampler.process_partial(Some(&[remainder]), None)
    }
    .map_err(|e| SeparatorError::Resample(e.to_string()))?;
    output.extend_from_slice(&result[0]);

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(rate: u32, secs: f32, hz: f32) -> Vec<f32> {
        let n = (rate as f32 * secs) as usize;
        (0..n)
            .map(|i| (2.0 * std::f32::consts::PI * hz * i as f32 / rate as f32).sin())
            .collect()
    }

    #[test]
    fn mono_is_duplicated_to_both_channels() {
        let decoded = DecodedAudio {
            channels: vec![vec![0.1, 0.2, 0.3]],
            sample_rate: 44100,
        };
        let stereo = to_stereo(decoded).unwrap();
        assert_eq!(stereo.left, stereo.right);
        assert_eq!(stereo.left, vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn surround_is_truncated_to_first_two_channels() {
        let decoded = DecodedAudio {
            channels: vec![
                vec![1.0; 8],
                vec![2.0; 8],
                vec![3.0; 8],
                vec![4.0; 8],
                vec![5.0; 8],
                vec![6.0; 8],
            ],
            sample_rate: 48000,
        };
        let stereo = to_stereo(decoded).unwrap();
        assert_eq!(stereo.left, vec![1.0; 8]);
        assert_eq!(stereo.right, vec![2.0; 8]);
    }

    #[test]
    fn zero_channels_is_an_error() {
        let decoded = DecodedAudio {
            channels: vec![],
            sample_rate: 44100,
        };
        assert!(to_stereo(decoded).is_err());
    }

    #[test]
    fn matching_rate_skips_resampling() {
        let audio = StereoAudio {
            left: vec![0.5; 100],
            right: vec![0.5; 100],
            sample_rate: 44100,
        };
        let out = resample(audio.clone(), 44100).unwrap();
        assert_eq!(out, audio);
    }

    #[test]
    fn upsampling_roughly_doubles_the_frame_count() {
        let audio = StereoAudio {
            left: sine(22050, 1.0, 440.0),
            right: sine(22050, 1.0, 440.0),
            sample_rate: 22050,
        };
        let out = resample(audio, 44100).unwrap();
        assert_eq!(out.sample_rate, 44100);
        // Sinc resampling pads a little at the tail; the length must land near 2x.
        let expected = 44100usize;
        assert!(
            out.len() >= expected * 9 / 10 && out.len() <= expected * 11 / 10,
            "got {} frames, expected about {}",
            out.len(),
            expected
        );
    }

    #[test]
    fn normalize_handles_mono_at_foreign_rate() {
        let decoded = DecodedAudio {
            channels: vec![sine(22050, 0.5, 220.0)],
            sample_rate: 22050,
        };
        let out = normalize(decoded, 44100).unwrap();
        assert_eq!(out.sample_rate, 44100);
        assert_eq!(out.left.len(), out.right.len());
        assert!(!out.is_empty());
    }
}
