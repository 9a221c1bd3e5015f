use std::path::PathBuf;

use thiserror::Error;

use crate::detection::domain::detection::Detection;
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_writer::VideoWriteError;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("failed to write video: {0}")]
    Video(#[from] VideoWriteError),
    #[error("failed to write image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("frame buffer does not match its {width}x{height} dimensions")]
    FrameBuffer { width: u32, height: u32 },
}

/// Whether the driver should keep pulling frames after a render.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderControl {
    Continue,
    Stop,
}

/// Presents a frame together with the detections found in it.
///
/// Renderers may draw into the frame in place, so they receive it mutably.
pub trait FrameRenderer: Send {
    /// Called once before the first frame.
    fn begin(&mut self, _metadata: &VideoMetadata) -> Result<(), RenderError> {
        Ok(())
    }

    fn render(
        &mut self,
        frame: &mut Frame,
        detections: &[Detection],
    ) -> Result<RenderControl, RenderError>;

    /// Flushes any buffered output. Called once, however the run ended.
    fn finish(&mut self) -> Result<(), RenderError> {
        Ok(())
    }
}
