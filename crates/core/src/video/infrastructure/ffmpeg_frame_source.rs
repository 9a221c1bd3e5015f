use std::path::Path;

use ffmpeg_next::format::Pixel;
use ffmpeg_next::software::scaling;
use ffmpeg_next::util::frame::video::Video as VideoFrame;

use crate::shared::frame::{Frame, RGB_CHANNELS};
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::frame_source::{FrameSource, FrameSourceError, SourceState, StopReason};

/// Decodes a video file or stream URL via ffmpeg-next (libavformat + libavcodec).
///
/// The demuxer, decoder and scaler are owned exclusively by this value and
/// released when it is dropped. Each pull reads just enough packets to
/// produce one frame, converts it to RGB24 and copies it into the caller's
/// buffer.
pub struct FfmpegFrameSource {
    input_ctx: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: Option<(scaling::Context, ScalerKey)>,
    decoded: VideoFrame,
    rgb: VideoFrame,
    video_stream_index: usize,
    metadata: VideoMetadata,
    frames_read: usize,
    eof_sent: bool,
    stop_reason: Option<StopReason>,
}

/// Input format and size a scaler was built for; decoders may change
/// either mid-stream.
type ScalerKey = (Pixel, u32, u32);

// Safety: FfmpegFrameSource is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegFrameSource {}

impl FfmpegFrameSource {
    /// Opens `path` for sequential decoding of its best video stream.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FrameSourceError> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(FrameSourceError::open_failed(path, "empty path"));
        }
        let fail = |reason: &dyn std::fmt::Display| FrameSourceError::open_failed(path, reason);

        ffmpeg_next::init().map_err(|e| fail(&e))?;
        let input_ctx = ffmpeg_next::format::input(&path).map_err(|e| fail(&e))?;

        let (video_stream_index, decoder, fps, total_frames) = {
            let stream = input_ctx
                .streams()
                .best(ffmpeg_next::media::Type::Video)
                .ok_or_else(|| fail(&"no video stream found"))?;
            let codec_ctx =
                ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())
                    .map_err(|e| fail(&e))?;
            let decoder = codec_ctx.decoder().video().map_err(|e| fail(&e))?;

            let rate = stream.rate();
            let fps = if rate.denominator() != 0 {
                rate.numerator() as f64 / rate.denominator() as f64
            } else {
                0.0
            };
            (stream.index(), decoder, fps, stream.frames().max(0) as usize)
        };

        let metadata = VideoMetadata {
            width: decoder.width(),
            height: decoder.height(),
            fps,
            total_frames,
            codec: decoder
                .codec()
                .map(|c| c.name().to_string())
                .unwrap_or_default(),
            source_path: Some(path.to_path_buf()),
        };

        log::info!(
            "Video opened successfully: {} ({}x{}, {:.2} fps, codec {})",
            path.display(),
            metadata.width,
            metadata.height,
            metadata.fps,
            metadata.codec
        );

        Ok(Self {
            input_ctx,
            decoder,
            scaler: None,
            decoded: VideoFrame::empty(),
            rgb: VideoFrame::empty(),
            video_stream_index,
            metadata,
            frames_read: 0,
            eof_sent: false,
            stop_reason: None,
        })
    }

    /// Returns `Ok(true)` with `frame` filled, `Ok(false)` at end of stream,
    /// or the reason decoding cannot continue.
    fn decode_next(&mut self, frame: &mut Frame) -> Result<bool, String> {
        loop {
            match classify_receive(self.decoder.receive_frame(&mut self.decoded)) {
                Receive::Frame => {
                    self.convert_into(frame)?;
                    return Ok(true);
                }
                Receive::Drained => return Ok(false),
                Receive::NeedInput => {}
                Receive::Failed(message) => return Err(message),
            }

            if self.eof_sent {
                return Ok(false);
            }

            let mut packet = ffmpeg_next::Packet::empty();
            match packet.read(&mut self.input_ctx) {
                Ok(()) => {
                    if packet.stream() != self.video_stream_index {
                        continue;
                    }
                    if let Err(e) = self.decoder.send_packet(&packet) {
                        log::debug!("Skipping undecodable packet: {e}");
                    }
                }
                Err(ffmpeg_next::Error::Eof) => {
                    self.decoder
                        .send_eof()
                        .map_err(|e| format!("failed to flush decoder: {e}"))?;
                    self.eof_sent = true;
                }
                Err(e) => return Err(format!("failed to read packet: {e}")),
            }
        }
    }

    fn convert_into(&mut self, frame: &mut Frame) -> Result<(), String> {
        let key = (
            self.decoded.format(),
            self.decoded.width(),
            self.decoded.height(),
        );
        let (_, width, height) = key;

        let stale = self.scaler.as_ref().map_or(true, |(_, k)| *k != key);
        if stale {
            self.rgb = VideoFrame::empty();
            let ctx = scaling::Context::get(
                key.0,
                width,
                height,
                Pixel::RGB24,
                width,
                height,
                scaling::Flags::BILINEAR,
            )
            .map_err(|e| format!("failed to create RGB converter: {e}"))?;
            self.scaler = Some((ctx, key));
        }

        let Some((scaler, _)) = self.scaler.as_mut() else {
            return Err("RGB converter unavailable".to_string());
        };
        scaler
            .run(&self.decoded, &mut self.rgb)
            .map_err(|e| format!("failed to convert frame to RGB: {e}"))?;

        frame.reshape(width, height, RGB_CHANNELS, self.frames_read);
        copy_rgb_rows(&self.rgb, width, height, frame.data_mut());
        Ok(())
    }

    fn stop(&mut self, reason: StopReason) {
        if let StopReason::DecodeFailed(ref message) = reason {
            log::warn!(
                "Decoding {} stopped after {} frames: {message}",
                self.source_display(),
                self.frames_read
            );
        } else {
            log::debug!(
                "End of stream for {} after {} frames",
                self.source_display(),
                self.frames_read
            );
        }
        self.stop_reason = Some(reason);
    }

    fn source_display(&self) -> String {
        self.metadata
            .source_path
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_default()
    }
}

impl FrameSource for FfmpegFrameSource {
    fn next_frame(&mut self, frame: &mut Frame) -> bool {
        if self.stop_reason.is_some() {
            return false;
        }
        match self.decode_next(frame) {
            Ok(true) => {
                self.frames_read += 1;
                true
            }
            Ok(false) => {
                self.stop(StopReason::EndOfStream);
                false
            }
            Err(message) => {
                self.stop(StopReason::DecodeFailed(message));
                false
            }
        }
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

impl Drop for FfmpegFrameSource {
    fn drop(&mut self) {
        log::debug!(
            "Releasing video handle for {} ({} frames read)",
            self.source_display(),
            self.frames_read
        );
    }
}

/// What a `receive_frame` call means for the pull loop.
#[derive(Debug, PartialEq)]
enum Receive {
    Frame,
    NeedInput,
    Drained,
    Failed(String),
}

/// Only `EAGAIN` asks for another packet; any other decoder error ends the stream.
fn classify_receive(result: Result<(), ffmpeg_next::Error>) -> Receive {
    match result {
        Ok(()) => Receive::Frame,
        Err(ffmpeg_next::Error::Eof) => Receive::Drained,
        Err(ffmpeg_next::Error::Other { errno }) if errno == ffmpeg_next::util::error::EAGAIN => {
            Receive::NeedInput
        }
        Err(e) => Receive::Failed(format!("decoder error: {e}")),
    }
}

/// Copies a packed RGB24 ffmpeg frame into `dest`, dropping row padding
/// (stride may exceed `width * 3`).
fn copy_rgb_rows(rgb: &VideoFrame, width: u32, height: u32, dest: &mut [u8]) {
    let stride = rgb.stride(0);
    let data = rgb.data(0);
    let row_len = width as usize * RGB_CHANNELS as usize;

    for (row, out) in dest.chunks_exact_mut(row_len).take(height as usize).enumerate() {
        let start = row * stride;
        out.copy_from_slice(&data[start..start + row_len]);
    }
}
