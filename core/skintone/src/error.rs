use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SkinToneError {
    #[error("image file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read image file: {0}")]
    Io(String),

    #[error("failed to decode image: {0}")]
    DecodeError(String),

    #[error("failed to encode result: {0}")]
    EncodeError(String),

    #[error("selected region contains no pixels")]
    EmptyRegion,

    #[error("raw buffer holds {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },

    #[error("analysis panicked: {0}")]
    Panicked(String),

    #[error("failed to load face detection model: {0}")]
    Model(String),

    #[error("margin ratio must be finite and >= 0.0, got {0}")]
    InvalidMarginRatio(f64),

    #[error("invalid detector tuning: {0}")]
    InvalidTuning(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("unknown skin tone: {0}")]
    UnknownTone(String),

    #[error("unknown presentation: {0}")]
    UnknownPresentation(String),

    #[error("no file selected")]
    MissingExtension,

    #[error("invalid file type: {0}")]
    DisallowedExtension(String),

    #[error("file too large: {size} bytes exceeds the {max} byte limit")]
    FileTooLarge { size: u64, max: u64 },

    #[error("recommendation service unavailable: {0}")]
    Recommender(String),
}
