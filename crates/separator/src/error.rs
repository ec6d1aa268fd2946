// crates/separator/src/error.rs
use std::path::PathBuf;

use thiserror::Error;

/// Errors from audio decoding, normalization, and separation backends.
#[derive(Debug, Error)]
pub enum SeparatorError {
    #[error("failed to open audio file {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("unsupported audio format: {path}")]
    UnsupportedFormat { path: PathBuf },

    #[error("failed to decode audio: {0}")]
    Decode(String),

    #[error("no audio samples decoded from {path}")]
    EmptyAudio { path: PathBuf },

    #[error("resample failed: {0}")]
    Resample(String),

    #[error("failed to write {path}: {message}")]
    Write { path: PathBuf, message: String },

    #[error("unknown separation model: {0}")]
    UnknownModel(String),

    #[error("separation failed: {0}")]
    Backend(String),
}
