// crates/separator/src/audio.rs
//! Audio file decode and encode.
//!
//! Decoding goes through Symphonia, so WAV, AIFF, FLAC, MP3, OGG Vorbis, and
//! AAC/M4A inputs all land in the same in-memory representation. Stems are
//! written back out as 32-bit float stereo WAV.

use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::SeparatorError;

/// Decoded audio with its original channel layout, one sample vector per
/// channel. Channel coercion happens later, in [`crate::normalize`].
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    pub channels: Vec<Vec<f32>>,
    pub sample_rate: u32,
}

/// Two-channel audio in the layout every separation backend consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct StereoAudio {
    pub left: Vec<f32>,
    pub right: Vec<f32>,
    pub sample_rate: u32,
}

impl StereoAudio {
    /// Number of sample frames per channel.
    pub fn len(&self) -> usize {
        self.left.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }
}

/// Decode an audio file into per-channel f32 samples.
///
/// Any channel count is accepted here; the caller decides how to coerce the
/// layout. Transient decode errors on individual packets are skipped, matching
/// how lossy codecs are normally handled.
pub fn decode(path: &Path) -> Result<DecodedAudio, SeparatorError> {
    let file = std::fs::File::open(path).map_err(|source| SeparatorError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|_| SeparatorError::UnsupportedFormat {
            path: path.to_path_buf(),
        })?;

    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| SeparatorError::Decode("no audio track found".into()))?
        .clone();

    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| SeparatorError::Decode("could not determine sample rate".into()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| SeparatorError::Decode(format!("failed to create decoder: {e}")))?;

    // Channel count may be unknown upfront for some codecs (e.g. AAC/M4A);
    // it is fixed by the first decoded packet.
    let mut channels: Vec<Vec<f32>> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(SeparatorError::Decode(format!("error reading packet: {e}"))),
        };

        if packet.track_id() != track.id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(symphonia::core::errors::Error::DecodeError(_)) => continue,
            Err(e) => return Err(SeparatorError::Decode(format!("error decoding packet: {e}"))),
        };

        let spec = *decoded.spec();
        let ch = spec.channels.count();
        if channels.is_empty() {
            channels = vec![Vec::new(); ch];
        } else if channels.len() != ch {
            return Err(SeparatorError::Decode(format!(
                "channel layout changed mid-stream ({} -> {})",
                channels.len(),
                ch
            )));
        }

        let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);
        for frame in sample_buf.samples().chunks_exact(ch) {
            for (channel, &sample) in channels.iter_mut().zip(frame) {
                channel.push(sample);
            }
        }
    }

    if channels.is_empty() || channels[0].is_empty() {
        return Err(SeparatorError::EmptyAudio {
            path: path.to_path_buf(),
        });
    }

    Ok(DecodedAudio {
        channels,
        sample_rate,
    })
}

/// Write stereo audio as a 32-bit float WAV file.
pub fn write_wav(path: &Path, audio: &StereoAudio) -> Result<(), SeparatorError> {
    let spec = WavSpec {
        channels: 2,
        sample_rate: audio.sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };

    let write_err = |e: hound::Error| SeparatorError::Write {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let mut writer = WavWriter::create(path, spec).map_err(write_err)?;
    for (l, r) in audio.left.iter().zip(audio.right.iter()) {
        writer.write_sample(*l).map_err(write_err)?;
        writer.write_sample(*r).map_err(write_err)?;
    }
    writer.finalize().map_err(write_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: usize) -> Vec<f32> {
        (0..n).map(|i| i as f32 / n as f32).collect()
    }

    #[test]
    fn decode_missing_file_is_open_error() {
        let err = decode(Path::new("/nonexistent/audio.wav")).unwrap_err();
        assert!(matches!(err, SeparatorError::Open { .. }));
    }

    #[test]
    fn decode_garbage_is_unsupported_format() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("not-audio.wav");
        std::fs::write(&path, b"definitely not a RIFF header").unwrap();

        let err = decode(&path).unwrap_err();
        assert!(matches!(err, SeparatorError::UnsupportedFormat { .. }));
    }

    #[test]
    fn written_wav_decodes_back_to_stereo() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("out.wav");

        let audio = StereoAudio {
            left: ramp(4410),
            right: ramp(4410),
            sample_rate: 44100,
        };
        write_wav(&path, &audio).unwrap();

        let decoded = decode(&path).unwrap();
        assert_eq!(decoded.channels.len(), 2);
        assert_eq!(decoded.sample_rate, 44100);
        assert_eq!(decoded.channels[0].len(), 4410);
    }
}
