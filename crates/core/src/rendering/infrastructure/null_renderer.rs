use crate::detection::domain::detection::Detection;
use crate::rendering::domain::frame_renderer::{FrameRenderer, RenderControl, RenderError};
use crate::shared::frame::Frame;

/// Renderer that produces no output.
///
/// Counts frames and asks the driver to stop once `stop_after` frames have
/// been seen, which makes it usable for dry runs and benchmarks.
#[derive(Debug, Default)]
pub struct NullRenderer {
    stop_after: Option<usize>,
    frames: usize,
    detections: usize,
}

impl NullRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop_after(frames: usize) -> Self {
        Self {
            stop_after: Some(frames),
            ..Self::default()
        }
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn detections(&self) -> usize {
        self.detections
    }
}

impl FrameRenderer for NullRenderer {
    fn render(
        &mut self,
        _frame: &mut Frame,
        detections: &[Detection],
    ) -> Result<RenderControl, RenderError> {
        self.frames += 1;
        self.detections += detections.len();
        match self.stop_after {
            Some(limit) if self.frames >= limit => Ok(RenderControl::Stop),
            _ => Ok(RenderControl::Continue),
        }
    }
}
