use std::path::Path;

use ffmpeg_next::format::Pixel;
use ffmpeg_next::software::scaling;
use ffmpeg_next::util::frame::video::Video as VideoFrame;

use crate::shared::frame::{Frame, RGB_CHANNELS};
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_writer::{VideoWriteError, VideoWriter};

/// Encodes RGB frames to an MPEG-4 video via ffmpeg-next.
pub struct FfmpegWriter {
    session: Option<EncodeSession>,
    frames_written: usize,
}

struct EncodeSession {
    octx: ffmpeg_next::format::context::Output,
    encoder: ffmpeg_next::codec::encoder::video::Encoder,
    scaler: scaling::Context,
    width: u32,
    height: u32,
    time_base: ffmpeg_next::Rational,
}

// Safety: FfmpegWriter is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegWriter {}

impl FfmpegWriter {
    pub fn new() -> Self {
        Self {
            session: None,
            frames_written: 0,
        }
    }

    pub fn frames_written(&self) -> usize {
        self.frames_written
    }
}

impl Default for FfmpegWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl EncodeSession {
    /// Moves every packet the encoder has ready into the container.
    fn drain(&mut self) -> Result<(), VideoWriteError> {
        let ost_time_base = self
            .octx
            .stream(0)
            .map(|s| s.time_base())
            .unwrap_or(self.time_base);

        let mut encoded = ffmpeg_next::Packet::empty();
        while self.encoder.receive_packet(&mut encoded).is_ok() {
            encoded.set_stream(0);
            encoded.rescale_ts(self.time_base, ost_time_base);
            encoded.write_interleaved(&mut self.octx)?;
        }
        Ok(())
    }
}

impl VideoWriter for FfmpegWriter {
    fn open(&mut self, path: &Path, metadata: &VideoMetadata) -> Result<(), VideoWriteError> {
        ffmpeg_next::init()?;

        let mut octx = ffmpeg_next::format::output(&path)?;
        let global_header = octx
            .format()
            .flags()
            .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

        // MPEG-4 part 2 ships with every ffmpeg build, unlike libx264.
        let codec = ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::MPEG4)
            .ok_or(VideoWriteError::EncoderUnavailable("MPEG-4"))?;
        let mut ost = octx.add_stream(Some(codec))?;

        let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()?;

        let fps = metadata.output_fps().round().max(1.0) as i32;
        let time_base = ffmpeg_next::Rational(1, fps);
        encoder_ctx.set_width(metadata.width);
        encoder_ctx.set_height(metadata.height);
        encoder_ctx.set_format(Pixel::YUV420P);
        encoder_ctx.set_time_base(time_base);
        encoder_ctx.set_frame_rate(Some(ffmpeg_next::Rational(fps, 1)));
        if global_header {
            encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }

        let encoder = encoder_ctx.open_with(ffmpeg_next::Dictionary::new())?;
        ost.set_parameters(&encoder);
        octx.write_header()?;

        let scaler = scaling::Context::get(
            Pixel::RGB24,
            metadata.width,
            metadata.height,
            Pixel::YUV420P,
            metadata.width,
            metadata.height,
            scaling::Flags::BILINEAR,
        )?;

        log::debug!(
            "Writing {}x{} @ {fps} fps to {}",
            metadata.width,
            metadata.height,
            path.display()
        );

        self.session = Some(EncodeSession {
            octx,
            encoder,
            scaler,
            width: metadata.width,
            height: metadata.height,
            time_base,
        });
        self.frames_written = 0;
        Ok(())
    }

    fn write(&mut self, frame: &Frame) -> Result<(), VideoWriteError> {
        let session = self.session.as_mut().ok_or(VideoWriteError::NotOpen)?;
        if frame.width() != session.width || frame.height() != session.height {
            return Err(VideoWriteError::FrameSize {
                width: session.width,
                height: session.height,
                actual_width: frame.width(),
                actual_height: frame.height(),
            });
        }

        let mut rgb_frame = VideoFrame::new(Pixel::RGB24, session.width, session.height);
        let stride = rgb_frame.stride(0);
        let row_len = session.width as usize * RGB_CHANNELS as usize;
        let dest = rgb_frame.data_mut(0);
        for (row, src) in frame.data().chunks_exact(row_len).enumerate() {
            let start = row * stride;
            dest[start..start + row_len].copy_from_slice(src);
        }

        let mut yuv_frame = VideoFrame::empty();
        session.scaler.run(&rgb_frame, &mut yuv_frame)?;
        yuv_frame.set_pts(Some(self.frames_written as i64));

        session.encoder.send_frame(&yuv_frame)?;
        session.drain()?;

        self.frames_written += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), VideoWriteError> {
        let Some(mut session) = self.session.take() else {
            return Ok(());
        };
        session.encoder.send_eof()?;
        session.drain()?;
        session.octx.write_trailer()?;
        log::debug!("Closed video output after {} frames", self.frames_written);
        Ok(())
    }
}
