//! YOLO object detector using ONNX Runtime via `ort`.
//!
//! Handles letterbox preprocessing, inference, box decoding and per-class
//! NMS for YOLOv8/YOLO11-style detection heads.
use std::path::Path;

use crate::detection::domain::detection::{non_max_suppression, Detection};
use crate::detection::domain::object_detector::{DetectionError, ObjectDetector};
use crate::shared::bounding_box::BoundingBox;
use crate::shared::config::AppConfig;
use crate::shared::constants::{DEFAULT_CONFIDENCE, DEFAULT_INPUT_SIZE, DEFAULT_IOU_THRESHOLD};
use crate::shared::frame::Frame;

use super::execution_provider::preferred_execution_providers;

/// Grey used for letterbox padding (YOLO convention).
const PAD_VALUE: f32 = 114.0 / 255.0;

/// Box coordinates plus at least one class score.
const MIN_FEATURES: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DetectorSettings {
    pub confidence: f64,
    pub iou_threshold: f64,
    /// Used only when the model's input shape is dynamic.
    pub input_size: u32,
    pub use_gpu: bool,
    /// Class count of the model head, used to tell its two output layouts apart.
    pub num_classes: Option<usize>,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            confidence: DEFAULT_CONFIDENCE,
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            input_size: DEFAULT_INPUT_SIZE,
            use_gpu: false,
            num_classes: None,
        }
    }
}

impl From<&AppConfig> for DetectorSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            confidence: config.confidence_threshold,
            iou_threshold: config.iou_threshold,
            input_size: config.input_size,
            use_gpu: config.use_gpu,
            num_classes: Some(config.class_names.len()),
        }
    }
}

/// YOLO detector backed by an ONNX Runtime session.
pub struct OnnxYoloDetector {
    session: ort::session::Session,
    settings: DetectorSettings,
    input_size: u32,
}

impl OnnxYoloDetector {
    /// Load a YOLO ONNX model and prepare for inference.
    ///
    /// The input resolution is read from the model's input shape (expecting
    /// NCHW). Falls back to `settings.input_size` if the shape is dynamic.
    pub fn new(model_path: &Path, settings: DetectorSettings) -> Result<Self, DetectionError> {
        let load_error = |reason: &dyn std::fmt::Display| DetectionError::ModelLoad {
            path: model_path.to_path_buf(),
            reason: reason.to_string(),
        };

        let mut builder = ort::session::Session::builder().map_err(|e| load_error(&e))?;
        if settings.use_gpu {
            builder = builder
                .with_execution_providers(preferred_execution_providers())
                .map_err(|e| load_error(&e))?;
        }
        let session = builder
            .commit_from_file(model_path)
            .map_err(|e| load_error(&e))?;

        // NCHW: [1, 3, H, W]; H and W are equal for YOLO exports.
        let input_size = session
            .inputs()
            .first()
            .and_then(|input| {
                if let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() {
                    if shape.len() >= 4 && shape[2] > 0 {
                        Some(shape[2] as u32)
                    } else {
                        None
                    }
                } else {
                    None
                }
            })
            .unwrap_or(settings.input_size);

        log::info!(
            "Loaded detection model {} (input {input_size}x{input_size})",
            model_path.display()
        );

        Ok(Self {
            session,
            settings,
            input_size,
        })
    }

    pub fn input_size(&self) -> u32 {
        self.input_size
    }
}

impl ObjectDetector for OnnxYoloDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, DetectionError> {
        if frame.is_empty() {
            return Err(DetectionError::EmptyFrame);
        }

        let (input_tensor, letterbox) = letterbox(frame, self.input_size);

        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err(DetectionError::UnexpectedOutput(
                "model produced no outputs".into(),
            ));
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let shape = tensor.shape().to_vec();
        let data = tensor
            .as_slice()
            .ok_or_else(|| DetectionError::UnexpectedOutput("non-contiguous output".into()))?;

        let candidates = decode_output(
            data,
            &shape,
            &letterbox,
            self.settings.confidence,
            self.settings.num_classes,
        )?;
        Ok(non_max_suppression(candidates, self.settings.iou_threshold))
    }
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

/// Mapping from letterboxed model coordinates back to frame pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Letterbox {
    scale: f64,
    pad_x: u32,
    pad_y: u32,
}

impl Letterbox {
    fn to_frame(self, cx: f64, cy: f64, w: f64, h: f64) -> BoundingBox {
        let b = BoundingBox::from_center(cx, cy, w, h);
        let px = self.pad_x as f64;
        let py = self.pad_y as f64;
        BoundingBox::new(
            (b.x1 - px) / self.scale,
            (b.y1 - py) / self.scale,
            (b.x2 - px) / self.scale,
            (b.y2 - py) / self.scale,
        )
    }
}

/// Letterbox-resize a frame to `target_size` x `target_size`, normalised to
/// [0, 1] in NCHW layout.
fn letterbox(frame: &Frame, target_size: u32) -> (ndarray::Array4<f32>, Letterbox) {
    let fw = frame.width() as f64;
    let fh = frame.height() as f64;
    let target = target_size as f64;

    let scale = (target / fw).min(target / fh);
    let new_w = ((fw * scale).round() as u32).min(target_size);
    let new_h = ((fh * scale).round() as u32).min(target_size);
    let pad_x = (target_size - new_w) / 2;
    let pad_y = (target_size - new_h) / 2;

    let mut tensor = ndarray::Array4::<f32>::from_elem(
        (1, 3, target_size as usize, target_size as usize),
        PAD_VALUE,
    );

    let src = frame.as_ndarray(); // [H, W, C] u8
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;

    // Nearest-neighbour resize into the padded region
    for y in 0..new_h as usize {
        let src_y = ((y as f64 / scale) as usize).min(src_h - 1);
        for x in 0..new_w as usize {
            let src_x = ((x as f64 / scale) as usize).min(src_w - 1);
            let ty = pad_y as usize + y;
            let tx = pad_x as usize + x;
            for c in 0..3 {
                tensor[[0, c, ty, tx]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }

    (
        tensor,
        Letterbox {
            scale,
            pad_x,
            pad_y,
        },
    )
}

// ---------------------------------------------------------------------------
// Postprocessing
// ---------------------------------------------------------------------------

/// Decodes a YOLO detection head into frame-space candidates above
/// `confidence`.
///
/// Accepts `[1, features, anchors]` (the usual export) or
/// `[1, anchors, features]`, where each anchor is `[cx, cy, w, h, score_0..]`.
/// With a known class count the layout is the axis holding `4 + num_classes`;
/// otherwise the shorter axis is taken as the feature axis.
fn decode_output(
    data: &[f32],
    shape: &[usize],
    letterbox: &Letterbox,
    confidence: f64,
    num_classes: Option<usize>,
) -> Result<Vec<Detection>, DetectionError> {
    if shape.len() != 3 {
        return Err(DetectionError::UnexpectedOutput(format!(
            "expected a rank-3 output, got shape {shape:?}"
        )));
    }
    let transposed = match num_classes.map(|n| n + 4) {
        Some(feats) if shape[1] == feats => true,
        Some(feats) if shape[2] == feats => false,
        _ => shape[1] < shape[2],
    };
    let (num_anchors, num_feats) = if transposed {
        (shape[2], shape[1])
    } else {
        (shape[1], shape[2])
    };
    if num_feats < MIN_FEATURES {
        return Err(DetectionError::UnexpectedOutput(format!(
            "output has {num_feats} features per anchor, need at least {MIN_FEATURES}"
        )));
    }
    if data.len() < num_anchors * num_feats {
        return Err(DetectionError::UnexpectedOutput(format!(
            "output holds {} values, shape {shape:?} needs {}",
            data.len(),
            num_anchors * num_feats
        )));
    }

    let feature = |anchor: usize, f: usize| -> f64 {
        if transposed {
            data[f * num_anchors + anchor] as f64
        } else {
            data[anchor * num_feats + f] as f64
        }
    };

    let mut detections = Vec::new();
    for anchor in 0..num_anchors {
        let (class_id, score) = (4..num_feats)
            .map(|f| (f - 4, feature(anchor, f)))
            .fold((0, f64::MIN), |best, cur| if cur.1 > best.1 { cur } else { best });
        if score < confidence {
            continue;
        }

        let bbox = letterbox.to_frame(
            feature(anchor, 0),
            feature(anchor, 1),
            feature(anchor, 2),
            feature(anchor, 3),
        );
        detections.push(Detection::new(class_id, bbox, score));
    }
    Ok(detections)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
