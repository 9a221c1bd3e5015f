use std::path::PathBuf;

use thiserror::Error;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

#[derive(Error, Debug)]
pub enum FrameSourceError {
    /// The media resource could not be opened for sequential decoding.
    #[error("failed to open video {path}: {reason}")]
    OpenFailed { path: PathBuf, reason: String },
}

impl FrameSourceError {
    pub fn open_failed(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        FrameSourceError::OpenFailed {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceState {
    /// Frames may still be pulled.
    Open,
    /// Terminal: every further pull returns `false`.
    Exhausted,
}

/// Why a source stopped producing frames.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StopReason {
    EndOfStream,
    /// The backend hit a non-recoverable error partway through the stream.
    DecodeFailed(String),
}

/// A pull-based, single-pass sequence of decoded frames.
///
/// A source is produced already open by its constructor, so failure to open
/// is observed before any frame is requested. Dropping the source releases
/// the underlying handle. Implementations are single-owner: they are never
/// `Clone`, so two readers cannot race over one decode position.
pub trait FrameSource: Send {
    /// Decodes the next frame into `frame`, reusing its allocation.
    ///
    /// Returns `true` when `frame` holds the next frame in stream order and
    /// `false` once the stream is exhausted, after which `frame` contents
    /// are unspecified. Exhaustion is permanent.
    fn next_frame(&mut self, frame: &mut Frame) -> bool;

    fn metadata(&self) -> &VideoMetadata;

    fn state(&self) -> SourceState;

    /// Number of frames yielded so far.
    fn frames_read(&self) -> usize;

    /// Set once the source is exhausted.
    fn stop_reason(&self) -> Option<&StopReason>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_failed_message_names_path() {
        let err = FrameSourceError::open_failed("/no/such/file.mp4", "No such file or directory");
        let message = err.to_string();
        assert!(message.contains("/no/such/file.mp4"));
        assert!(message.contains("No such file or directory"));
    }
}
