use std::path::PathBuf;

/// Stream properties reported by a frame source once it is open.
///
/// `total_frames` is the container's estimate and is 0 when unknown;
/// only the frame source's end-of-stream signal is authoritative.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub total_frames: usize,
    pub codec: String,
    pub source_path: Option<PathBuf>,
}

impl VideoMetadata {
    /// Frame rate to use when encoding output; falls back to 30 when the
    /// source does not advertise one.
    pub fn output_fps(&self) -> f64 {
        if self.fps > 0.0 {
            self.fps
        } else {
            30.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(fps: f64) -> VideoMetadata {
        VideoMetadata {
            width: 1920,
            height: 1080,
            fps,
            total_frames: 900,
            codec: "h264".to_string(),
            source_path: Some(PathBuf::from("/tmp/test.mp4")),
        }
    }

    #[test]
    fn test_construction() {
        let meta = metadata(30.0);
        assert_eq!(meta.width, 1920);
        assert_eq!(meta.height, 1080);
        assert_eq!(meta.total_frames, 900);
        assert_eq!(meta.codec, "h264");
        assert_eq!(meta.source_path, Some(PathBuf::from("/tmp/test.mp4")));
    }

    #[test]
    fn test_output_fps_uses_source_rate() {
        assert_eq!(metadata(25.0).output_fps(), 25.0);
    }

    #[test]
    fn test_output_fps_falls_back_when_unknown() {
        assert_eq!(metadata(0.0).output_fps(), 30.0);
    }
}
