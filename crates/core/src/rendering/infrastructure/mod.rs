pub mod box_painter;
pub mod image_sequence_renderer;
pub mod null_renderer;
pub mod video_file_renderer;
