use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;

use crate::detection::domain::object_detector::{DetectionError, ObjectDetector};
use crate::rendering::domain::frame_renderer::{FrameRenderer, RenderControl, RenderError};
use crate::shared::frame::Frame;
use crate::video::domain::frame_source::{FrameSource, StopReason};

use super::pipeline_logger::PipelineLogger;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("detection failed on frame {frame}: {source}")]
    Detection {
        frame: usize,
        #[source]
        source: DetectionError,
    },
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// What ended a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopCause {
    SourceExhausted,
    RendererStopped,
    FrameLimit,
    Cancelled,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RunSummary {
    pub frames_processed: usize,
    pub total_detections: usize,
    pub stop_cause: StopCause,
    /// Set when the run ended because the source ran dry.
    pub source_stop: Option<StopReason>,
}

/// Drives the decode, detect, render loop over a single frame buffer.
pub struct DetectVideoUseCase {
    max_frames: Option<usize>,
    cancelled: Arc<AtomicBool>,
}

impl Default for DetectVideoUseCase {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectVideoUseCase {
    pub fn new() -> Self {
        Self {
            max_frames: None,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_max_frames(mut self, max_frames: Option<usize>) -> Self {
        self.max_frames = max_frames;
        self
    }

    /// Shares a flag that stops the run before the next frame once set.
    pub fn with_cancel_flag(mut self, cancelled: Arc<AtomicBool>) -> Self {
        self.cancelled = cancelled;
        self
    }

    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    /// Runs the loop until the source is exhausted, the renderer asks to
    /// stop, the frame limit is reached, or the run is cancelled.
    ///
    /// `renderer.finish()` is called once `begin` has succeeded, even when a
    /// frame fails. The first error wins.
    pub fn execute(
        &self,
        source: &mut dyn FrameSource,
        detector: &mut dyn ObjectDetector,
        renderer: &mut dyn FrameRenderer,
        logger: &mut dyn PipelineLogger,
    ) -> Result<RunSummary, PipelineError> {
        let metadata = source.metadata().clone();
        logger.info(&format!(
            "Processing {}x{} @ {:.2} fps ({} frames)",
            metadata.width, metadata.height, metadata.fps, metadata.total_frames
        ));

        renderer.begin(&metadata)?;
        let outcome = self.run_frames(source, detector, renderer, logger, metadata.total_frames);
        let finished = renderer.finish();

        let summary = outcome?;
        finished?;

        if let Some(StopReason::DecodeFailed(reason)) = &summary.source_stop {
            logger.info(&format!(
                "Source stopped early after {} frames: {reason}",
                summary.frames_processed
            ));
        }
        logger.summary();
        Ok(summary)
    }

    fn run_frames(
        &self,
        source: &mut dyn FrameSource,
        detector: &mut dyn ObjectDetector,
        renderer: &mut dyn FrameRenderer,
        logger: &mut dyn PipelineLogger,
        total: usize,
    ) -> Result<RunSummary, PipelineError> {
        let mut frame = Frame::empty();
        let mut frames_processed = 0;
        let mut total_detections = 0;

        let stop_cause = loop {
            if self.cancelled.load(Ordering::Relaxed) {
                break StopCause::Cancelled;
            }
            if self.max_frames.is_some_and(|max| frames_processed >= max) {
                break StopCause::FrameLimit;
            }

            let t0 = Instant::now();
            if !source.next_frame(&mut frame) {
                break StopCause::SourceExhausted;
            }
            logger.timing("decode", elapsed_ms(t0));

            let t0 = Instant::now();
            let detections = detector
                .detect(&frame)
                .map_err(|source| PipelineError::Detection {
                    frame: frame.index(),
                    source,
                })?;
            logger.timing("detect", elapsed_ms(t0));
            logger.metric("detections", detections.len() as f64);
            total_detections += detections.len();

            let t0 = Instant::now();
            let control = renderer.render(&mut frame, &detections)?;
            logger.timing("render", elapsed_ms(t0));

            frames_processed += 1;
            logger.progress(frames_processed, total);

            if control == RenderControl::Stop {
                break StopCause::RendererStopped;
            }
        };

        let source_stop = match stop_cause {
            StopCause::SourceExhausted => source.stop_reason().cloned(),
            _ => None,
        };
        log::debug!("Run ended: {stop_cause:?} after {frames_processed} frames");

        Ok(RunSummary {
            frames_processed,
            total_detections,
            stop_cause,
            source_stop,
        })
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
