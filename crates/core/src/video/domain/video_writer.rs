use std::path::Path;

use thiserror::Error;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

#[derive(Error, Debug)]
pub enum VideoWriteError {
    #[error("video writer is not open")]
    NotOpen,
    #[error("no {0} encoder available")]
    EncoderUnavailable(&'static str),
    #[error("frame is {actual_width}x{actual_height}, writer expects {width}x{height}")]
    FrameSize {
        width: u32,
        height: u32,
        actual_width: u32,
        actual_height: u32,
    },
    #[error("ffmpeg: {0}")]
    Ffmpeg(#[from] ffmpeg_next::Error),
}

/// Abstracts video encoding so renderers can write output without
/// depending on a specific codec library.
pub trait VideoWriter: Send {
    fn open(&mut self, path: &Path, metadata: &VideoMetadata) -> Result<(), VideoWriteError>;

    fn write(&mut self, frame: &Frame) -> Result<(), VideoWriteError>;

    /// Flushes buffered packets and finalises the container. Closing a
    /// writer that is not open is a no-op.
    fn close(&mut self) -> Result<(), VideoWriteError>;
}
