use std::path::{Path, PathBuf};

use crate::detection::domain::detection::Detection;
use crate::rendering::domain::frame_renderer::{FrameRenderer, RenderControl, RenderError};
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_writer::VideoWriter;

use super::box_painter::BoxPainter;

/// Paints detection boxes and encodes the annotated frames to a video file.
pub struct VideoFileRenderer {
    output_path: PathBuf,
    writer: Box<dyn VideoWriter>,
    painter: BoxPainter,
}

impl VideoFileRenderer {
    pub fn new(output_path: &Path, writer: Box<dyn VideoWriter>, painter: BoxPainter) -> Self {
        Self {
            output_path: output_path.to_path_buf(),
            writer,
            painter,
        }
    }
}

impl FrameRenderer for VideoFileRenderer {
    fn begin(&mut self, metadata: &VideoMetadata) -> Result<(), RenderError> {
        self.writer.open(&self.output_path, metadata)?;
        Ok(())
    }

    fn render(
        &mut self,
        frame: &mut Frame,
        detections: &[Detection],
    ) -> Result<RenderControl, RenderError> {
        self.painter.paint(frame, detections);
        self.writer.write(frame)?;
        Ok(RenderControl::Continue)
    }

    fn finish(&mut self) -> Result<(), RenderError> {
        self.writer.close()?;
        log::info!("Annotated video written to {}", self.output_path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use crate::shared::bounding_box::BoundingBox;
    use crate::video::domain::video_writer::VideoWriteError;

    #[derive(Default)]
    struct Recorded {
        opened: Option<PathBuf>,
        frames: Vec<Frame>,
        closed: bool,
    }

    struct RecordingWriter(Arc<Mutex<Recorded>>);

    impl VideoWriter for RecordingWriter {
        fn open(&mut self, path: &Path, _metadata: &VideoMetadata) -> Result<(), VideoWriteError> {
            self.0.lock().unwrap().opened = Some(path.to_path_buf());
            Ok(())
        }

        fn write(&mut self, frame: &Frame) -> Result<(), VideoWriteError> {
            self.0.lock().unwrap().frames.push(frame.clone());
            Ok(())
        }

        fn close(&mut self) -> Result<(), VideoWriteError> {
            self.0.lock().unwrap().closed = true;
            Ok(())
        }
    }

    struct ClosedWriter;

    impl VideoWriter for ClosedWriter {
        fn open(&mut self, _path: &Path, _metadata: &VideoMetadata) -> Result<(), VideoWriteError> {
            Ok(())
        }

        fn write(&mut self, _frame: &Frame) -> Result<(), VideoWriteError> {
            Err(VideoWriteError::NotOpen)
        }

        fn close(&mut self) -> Result<(), VideoWriteError> {
            Ok(())
        }
    }

    fn metadata() -> VideoMetadata {
        VideoMetadata {
            width: 8,
            height: 8,
            fps: 30.0,
            total_frames: 1,
            codec: String::new(),
            source_path: None,
        }
    }

    #[test]
    fn test_paints_then_writes_each_frame() {
        let recorded = Arc::new(Mutex::new(Recorded::default()));
        let mut renderer = VideoFileRenderer::new(
            Path::new("/tmp/out.mp4"),
            Box::new(RecordingWriter(recorded.clone())),
            BoxPainter::new([255, 0, 0], 1),
        );

        renderer.begin(&metadata()).unwrap();
        let mut frame = Frame::new(vec![0u8; 8 * 8 * 3], 8, 8, 3, 0);
        let boxes = [Detection::new(
            0,
            BoundingBox::new(1.0, 1.0, 7.0, 7.0),
            0.8,
        )];
        let control = renderer.render(&mut frame, &boxes).unwrap();
        renderer.finish().unwrap();

        assert_eq!(control, RenderControl::Continue);
        let recorded = recorded.lock().unwrap();
        assert_eq!(recorded.opened.as_deref(), Some(Path::new("/tmp/out.mp4")));
        assert!(recorded.closed);
        assert_eq!(recorded.frames.len(), 1);
        // The written frame carries the painted outline.
        assert_eq!(recorded.frames[0].as_ndarray()[[1, 1, 0]], 255);
    }

    #[test]
    fn test_writer_error_propagates() {
        let mut renderer =
            VideoFileRenderer::new(Path::new("/tmp/out.mp4"), Box::new(ClosedWriter), BoxPainter::default());
        let mut frame = Frame::new(vec![0u8; 12], 2, 2, 3, 0);
        assert!(matches!(
            renderer.render(&mut frame, &[]),
            Err(RenderError::Video(VideoWriteError::NotOpen))
        ));
    }
}
