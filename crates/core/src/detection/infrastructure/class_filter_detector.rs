use crate::detection::domain::detection::Detection;
use crate::detection::domain::object_detector::{DetectionError, ObjectDetector};
use crate::shared::frame::Frame;

/// Decorator that keeps only detections of one class of interest.
pub struct ClassFilterDetector {
    inner: Box<dyn ObjectDetector>,
    class_id: usize,
}

impl ClassFilterDetector {
    pub fn new(inner: Box<dyn ObjectDetector>, class_id: usize) -> Self {
        Self { inner, class_id }
    }

    pub fn class_id(&self) -> usize {
        self.class_id
    }
}

impl ObjectDetector for ClassFilterDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, DetectionError> {
        let mut detections = self.inner.detect(frame)?;
        detections.retain(|d| d.class_id == self.class_id);
        Ok(detections)
    }
}
