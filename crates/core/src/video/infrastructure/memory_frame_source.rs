use std::collections::VecDeque;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::frame_source::{FrameSource, SourceState, StopReason};

/// Frame source backed by frames already in memory.
///
/// Useful for driving the pipeline without a codec, e.g. from a decoded
/// image or in tests. Each pull moves the next stored frame into the
/// caller's buffer, renumbered in pull order.
pub struct MemoryFrameSource {
    frames: VecDeque<Frame>,
    metadata: VideoMetadata,
    frames_read: usize,
    stop_reason: Option<StopReason>,
}

impl MemoryFrameSource {
    pub fn new(frames: Vec<Frame>, fps: f64) -> Self {
        let (width, height) = frames
            .first()
            .map(|f| (f.width(), f.height()))
            .unwrap_or((0, 0));
        let metadata = VideoMetadata {
            width,
            height,
            fps,
            total_frames: frames.len(),
            codec: "rawvideo".to_string(),
            source_path: None,
        };
        Self {
            frames: frames.into(),
            metadata,
            frames_read: 0,
            stop_reason: None,
        }
    }
}

impl FrameSource for MemoryFrameSource {
    fn next_frame(&mut self, frame: &mut Frame) -> bool {
        if self.stop_reason.is_some() {
            return false;
        }
        let Some(next) = self.frames.pop_front() else {
            self.stop_reason = Some(StopReason::EndOfStream);
            return false;
        };

        frame.reshape(
            next.width(),
            next.height(),
            next.channels(),
            self.frames_read,
        );
        frame.data_mut().copy_from_slice(next.data());
        self.frames_read += 1;
        true
    }

    fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    fn state(&self) -> SourceState {
        if self.stop_reason.is_some() {
            SourceState::Exhausted
        } else {
            SourceState::Open
        }
    }

    fn frames_read(&self) -> usize {
        self.frames_read
    }

    fn stop_reason(&self) -> Option<&StopReason> {
        self.stop_reason.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_frames(count: usize) -> Vec<Frame> {
        (0..count)
            .map(|i| Frame::new(vec![i as u8; 4 * 2 * 3], 4, 2, 3, 100 + i))
            .collect()
    }

    #[test]
    fn test_ten_frames_then_false() {
        let mut source = MemoryFrameSource::new(solid_frames(10), 30.0);
        let mut frame = Frame::empty();
        for _ in 0..10 {
            assert!(source.next_frame(&mut frame));
        }
        assert!(!source.next_frame(&mut frame));
        assert_eq!(source.stop_reason(), Some(&StopReason::EndOfStream));
    }

    #[test]
    fn test_empty_source_is_exhausted_on_first_pull() {
        let mut source = MemoryFrameSource::new(Vec::new(), 30.0);
        let mut frame = Frame::empty();
        assert_eq!(source.state(), SourceState::Open);
        assert!(!source.next_frame(&mut frame));
        assert_eq!(source.state(), SourceState::Exhausted);
        assert_eq!(source.metadata().width, 0);
    }

    #[test]
    fn test_terminal_state_never_resurrects() {
        let mut source = MemoryFrameSource::new(solid_frames(1), 30.0);
        let mut frame = Frame::empty();
        assert!(source.next_frame(&mut frame));
        for _ in 0..3 {
            assert!(!source.next_frame(&mut frame));
        }
        assert_eq!(source.frames_read(), 1);
    }

    #[test]
    fn test_frames_are_ordered_and_renumbered() {
        let mut source = MemoryFrameSource::new(solid_frames(3), 30.0);
        let mut frame = Frame::empty();
        let mut seen = Vec::new();
        while source.next_frame(&mut frame) {
            seen.push((frame.index(), frame.data()[0]));
        }
        assert_eq!(seen, vec![(0, 0), (1, 1), (2, 2)]);
    }

    #[test]
    fn test_metadata_from_first_frame() {
        let source = MemoryFrameSource::new(solid_frames(2), 25.0);
        let meta = source.metadata();
        assert_eq!((meta.width, meta.height), (4, 2));
        assert_eq!(meta.total_frames, 2);
        assert_eq!(meta.fps, 25.0);
    }
}
