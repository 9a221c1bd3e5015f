use thiserror::Error;

use crate::shared::frame::Frame;

use super::detection::Detection;

#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("failed to load model {path}: {reason}")]
    ModelLoad {
        path: std::path::PathBuf,
        reason: String,
    },
    #[error("inference failed: {0}")]
    Inference(#[from] ort::Error),
    #[error("unexpected model output: {0}")]
    UnexpectedOutput(String),
    #[error("cannot run detection on an empty frame")]
    EmptyFrame,
}

/// Finds objects in a frame.
///
/// Implementations may be stateful (e.g. hold an inference session that
/// needs exclusive access), hence `&mut self`.
pub trait ObjectDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, DetectionError>;
}
