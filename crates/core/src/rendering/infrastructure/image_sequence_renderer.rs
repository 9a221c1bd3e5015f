use std::fs;
use std::path::{Path, PathBuf};

use crate::detection::domain::detection::Detection;
use crate::rendering::domain::frame_renderer::{FrameRenderer, RenderControl, RenderError};
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

use super::box_painter::BoxPainter;

/// Paints detection boxes and saves every frame as `frame_NNNNNN.png`
/// in an output directory, using the `image` crate.
pub struct ImageSequenceRenderer {
    output_dir: PathBuf,
    painter: BoxPainter,
    only_with_detections: bool,
    written: usize,
}

impl ImageSequenceRenderer {
    pub fn new(output_dir: &Path, painter: BoxPainter) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
            painter,
            only_with_detections: false,
            written: 0,
        }
    }

    /// Skip frames in which nothing was detected.
    pub fn only_with_detections(mut self, enabled: bool) -> Self {
        self.only_with_detections = enabled;
        self
    }

    pub fn frame_path(&self, index: usize) -> PathBuf {
        self.output_dir.join(format!("frame_{index:06}.png"))
    }
}

impl FrameRenderer for ImageSequenceRenderer {
    fn begin(&mut self, _metadata: &VideoMetadata) -> Result<(), RenderError> {
        fs::create_dir_all(&self.output_dir).map_err(|source| RenderError::OutputDir {
            path: self.output_dir.clone(),
            source,
        })
    }

    fn render(
        &mut self,
        frame: &mut Frame,
        detections: &[Detection],
    ) -> Result<RenderControl, RenderError> {
        if self.only_with_detections && detections.is_empty() {
            return Ok(RenderControl::Continue);
        }
        self.painter.paint(frame, detections);

        let img = image::RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
            .ok_or(RenderError::FrameBuffer {
                width: frame.width(),
                height: frame.height(),
            })?;
        let path = self.frame_path(frame.index());
        img.save(&path)
            .map_err(|source| RenderError::Image { path, source })?;

        self.written += 1;
        Ok(RenderControl::Continue)
    }

    fn finish(&mut self) -> Result<(), RenderError> {
        log::info!(
            "Wrote {} annotated frames to {}",
            self.written,
            self.output_dir.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::bounding_box::BoundingBox;

    fn metadata() -> VideoMetadata {
        VideoMetadata {
            width: 10,
            height: 10,
            fps: 30.0,
            total_frames: 2,
            codec: String::new(),
            source_path: None,
        }
    }

    fn frame(index: usize) -> Frame {
        Frame::new(vec![50u8; 10 * 10 * 3], 10, 10, 3, index)
    }

    fn boxes() -> Vec<Detection> {
        vec![Detection::new(0, BoundingBox::new(0.0, 0.0, 5.0, 5.0), 0.7)]
    }

    #[test]
    fn test_writes_annotated_png_per_frame() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("frames");
        let mut renderer = ImageSequenceRenderer::new(&out, BoxPainter::new([0, 255, 0], 1));

        renderer.begin(&metadata()).unwrap();
        renderer.render(&mut frame(0), &boxes()).unwrap();
        renderer.render(&mut frame(1), &[]).unwrap();
        renderer.finish().unwrap();

        let first = image::open(out.join("frame_000000.png")).unwrap().to_rgb8();
        assert_eq!(first.get_pixel(0, 0).0, [0, 255, 0]);
        assert_eq!(first.get_pixel(8, 8).0, [50, 50, 50]);
        assert!(out.join("frame_000001.png").exists());
    }

    #[test]
    fn test_only_with_detections_skips_empty_frames() {
        let dir = tempfile::tempdir().unwrap();
        let mut renderer =
            ImageSequenceRenderer::new(dir.path(), BoxPainter::default()).only_with_detections(true);

        renderer.begin(&metadata()).unwrap();
        renderer.render(&mut frame(0), &[]).unwrap();
        renderer.render(&mut frame(1), &boxes()).unwrap();

        assert!(!renderer.frame_path(0).exists());
        assert!(renderer.frame_path(1).exists());
    }

    #[test]
    fn test_unwritable_directory_fails_on_begin() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, b"x").unwrap();

        let mut renderer = ImageSequenceRenderer::new(&blocker.join("frames"), BoxPainter::default());
        assert!(matches!(
            renderer.begin(&metadata()),
            Err(RenderError::OutputDir { .. })
        ));
    }
}
