use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;

use framewatch_core::detection::infrastructure::class_filter_detector::ClassFilterDetector;
use framewatch_core::detection::infrastructure::onnx_yolo_detector::{
    DetectorSettings, OnnxYoloDetector,
};
use framewatch_core::pipeline::detect_video_use_case::{DetectVideoUseCase, StopCause};
use framewatch_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use framewatch_core::rendering::domain::frame_renderer::FrameRenderer;
use framewatch_core::rendering::infrastructure::box_painter::BoxPainter;
use framewatch_core::rendering::infrastructure::image_sequence_renderer::ImageSequenceRenderer;
use framewatch_core::rendering::infrastructure::null_renderer::NullRenderer;
use framewatch_core::rendering::infrastructure::video_file_renderer::VideoFileRenderer;
use framewatch_core::shared::config::{AppConfig, TargetClass};
use framewatch_core::video::infrastructure::ffmpeg_frame_source::FfmpegFrameSource;
use framewatch_core::video::infrastructure::ffmpeg_writer::FfmpegWriter;

/// Detects one class of object in a video with a YOLO model and draws its boxes.
#[derive(Parser, Debug)]
#[command(name = "framewatch")]
struct Cli {
    /// Input video file (may also come from --config).
    input: Option<PathBuf>,

    /// YOLO ONNX model file.
    #[arg(long)]
    model: Option<PathBuf>,

    /// JSON config file; flags given on the command line take precedence.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Class to report, by name (e.g. person) or numeric id.
    #[arg(long = "class")]
    target_class: Option<String>,

    /// Detection confidence threshold (0.0-1.0).
    #[arg(long)]
    confidence: Option<f64>,

    /// IoU threshold for non-maximum suppression (0.0-1.0).
    #[arg(long)]
    iou: Option<f64>,

    /// Model input size in pixels, used when the model shape is dynamic.
    #[arg(long)]
    input_size: Option<u32>,

    /// Use the platform's accelerated execution provider.
    #[arg(long)]
    gpu: bool,

    /// Write an annotated MPEG-4 video.
    #[arg(long, conflicts_with = "frames_dir")]
    output: Option<PathBuf>,

    /// Write annotated frames as PNG files into this directory.
    #[arg(long)]
    frames_dir: Option<PathBuf>,

    /// Stop after this many frames.
    #[arg(long)]
    max_frames: Option<usize>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    let class_id = config.target_class_id()?;
    let class_name = config.class_name(class_id).unwrap_or("?").to_string();

    let (Some(video_path), Some(model_path)) = (&config.video_path, &config.model_path) else {
        return Err("video and model paths are required".into());
    };

    let cancelled = Arc::new(AtomicBool::new(false));
    let handler_flag = cancelled.clone();
    ctrlc::set_handler(move || {
        log::warn!("Interrupted, stopping after the current frame");
        handler_flag.store(true, Ordering::Relaxed);
    })?;

    let (mut source, mut detector) = open_inputs(video_path, model_path, &config, class_id)?;
    log::info!("Watching for '{class_name}' (class {class_id})");

    let mut renderer = build_renderer(&cli);
    let mut logger = StdoutPipelineLogger::default();

    let summary = DetectVideoUseCase::new()
        .with_max_frames(cli.max_frames)
        .with_cancel_flag(cancelled)
        .execute(
            &mut source,
            &mut detector,
            renderer.as_mut(),
            &mut logger,
        )?;

    let ended = match summary.stop_cause {
        StopCause::SourceExhausted => "end of video",
        StopCause::RendererStopped => "renderer stopped",
        StopCause::FrameLimit => "frame limit",
        StopCause::Cancelled => "cancelled",
    };
    log::info!(
        "Done ({ended}): {} frames, {} '{class_name}' detections",
        summary.frames_processed,
        summary.total_detections
    );
    Ok(())
}

/// Loads the config file, if any, applies flag overrides and validates the result.
fn resolve_config(cli: &Cli) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };

    if let Some(input) = &cli.input {
        config.video_path = Some(input.clone());
    }
    if let Some(model) = &cli.model {
        config.model_path = Some(model.clone());
    }
    if let Some(class) = &cli.target_class {
        config.target_class = TargetClass::parse(class);
    }
    if let Some(confidence) = cli.confidence {
        config.confidence_threshold = confidence;
    }
    if let Some(iou) = cli.iou {
        config.iou_threshold = iou;
    }
    if let Some(size) = cli.input_size {
        config.input_size = size;
    }
    if cli.gpu {
        config.use_gpu = true;
    }

    config.validate()?;
    Ok(config)
}

/// Opens the video first so a bad input path fails before the model is loaded.
fn open_inputs(
    video_path: &Path,
    model_path: &Path,
    config: &AppConfig,
    class_id: usize,
) -> Result<(FfmpegFrameSource, ClassFilterDetector), Box<dyn std::error::Error>> {
    let source = FfmpegFrameSource::open(video_path)?;

    let yolo = OnnxYoloDetector::new(model_path, DetectorSettings::from(config))?;
    log::info!("Model loaded ({}px input)", yolo.input_size());
    Ok((source, ClassFilterDetector::new(Box::new(yolo), class_id)))
}

fn build_renderer(cli: &Cli) -> Box<dyn FrameRenderer> {
    if let Some(output) = &cli.output {
        Box::new(VideoFileRenderer::new(
            output,
            Box::new(FfmpegWriter::new()),
            BoxPainter::default(),
        ))
    } else if let Some(dir) = &cli.frames_dir {
        Box::new(ImageSequenceRenderer::new(dir, BoxPainter::default()))
    } else {
        Box::new(NullRenderer::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use framewatch_core::shared::config::ConfigError;
    use framewatch_core::video::domain::frame_source::FrameSourceError;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("framewatch").chain(args.iter().copied())).unwrap()
    }

    fn config_error(cli: &Cli) -> ConfigError {
        let err = resolve_config(cli).unwrap_err();
        *err.downcast::<ConfigError>().unwrap()
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = parse(&[
            "in.mp4",
            "--model",
            "yolo.onnx",
            "--class",
            "car",
            "--confidence",
            "0.4",
            "--iou",
            "0.6",
            "--input-size",
            "320",
            "--gpu",
        ]);
        let config = resolve_config(&cli).unwrap();
        assert_eq!(config.video_path, Some(PathBuf::from("in.mp4")));
        assert_eq!(config.target_class_id().unwrap(), 2);
        assert_eq!(config.confidence_threshold, 0.4);
        assert_eq!(config.iou_threshold, 0.6);
        assert_eq!(config.input_size, 320);
        assert!(config.use_gpu);
    }

    #[test]
    fn test_numeric_class() {
        let cli = parse(&["in.mp4", "--model", "m.onnx", "--class", "16"]);
        let config = resolve_config(&cli).unwrap();
        assert_eq!(config.class_name(config.target_class_id().unwrap()), Some("dog"));
    }

    #[test]
    fn test_missing_model_rejected_before_opening() {
        let cli = parse(&["in.mp4"]);
        assert!(matches!(config_error(&cli), ConfigError::Missing("model path")));
    }

    #[test]
    fn test_bad_threshold_rejected() {
        let cli = parse(&["in.mp4", "--model", "m.onnx", "--confidence", "1.5"]);
        assert!(matches!(config_error(&cli), ConfigError::OutOfRange { .. }));
    }

    #[test]
    fn test_unknown_class_rejected() {
        let cli = parse(&["in.mp4", "--model", "m.onnx", "--class", "dragon"]);
        assert!(matches!(config_error(&cli), ConfigError::UnknownClass(_)));
    }

    #[test]
    fn test_missing_config_file() {
        let cli = parse(&["--config", "/nonexistent/framewatch.json"]);
        assert!(matches!(config_error(&cli), ConfigError::Read { .. }));
    }

    #[test]
    fn test_bad_video_reported_before_model_load() {
        let config = AppConfig::default();
        let result = open_inputs(
            Path::new("/no/such/clip.mp4"),
            Path::new("/no/such/model.onnx"),
            &config,
            0,
        );
        let Err(err) = result else {
            panic!("expected startup to fail");
        };
        assert!(err.downcast_ref::<FrameSourceError>().is_some());
        assert!(err.to_string().contains("/no/such/clip.mp4"));
    }

    #[test]
    fn test_output_and_frames_dir_conflict() {
        let result = Cli::try_parse_from([
            "framewatch",
            "in.mp4",
            "--output",
            "out.mp4",
            "--frames-dir",
            "frames",
        ]);
        assert!(result.is_err());
    }
}
