use thiserror::Error;

use crate::types::ProductionStage;

#[derive(Error, Debug)]
pub enum IdeatorError {
    #[error("Missing API key for {service}: set it with `ideator config` or the environment")]
    MissingApiKey { service: String },

    #[error("{service} rejected the configured API key")]
    AuthRejected { service: String },

    #[error("Nothing to analyze: {reason}")]
    EmptyInput { reason: String },

    #[error("{service} request failed: {reason}")]
    Upstream { service: String, reason: String },

    #[error("No {what} available")]
    MissingPayload { what: String },

    #[error("Image count {requested} is out of range ({min}-{max}) for this format")]
    InvalidImageCount {
        requested: usize,
        min: usize,
        max: usize,
    },

    #[error("Pipeline is in stage {actual:?}, expected {expected:?}")]
    StageMismatch {
        expected: ProductionStage,
        actual: ProductionStage,
    },

    #[error("Video assembly failed: {reason}")]
    AssemblyFailed { reason: String },

    #[error("Export packaging failed: {reason}")]
    PackagingFailed { reason: String },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("WAV error: {0}")]
    WavError(#[from] hound::Error),

    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Archive error: {0}")]
    ZipError(#[from] zip::result::ZipError),
}

pub type Result<T> = std::result::Result<T, IdeatorError>;
