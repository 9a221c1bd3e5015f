pub mod ffmpeg_frame_source;
pub mod ffmpeg_writer;
pub mod memory_frame_source;
