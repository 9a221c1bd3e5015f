use crate::shared::bounding_box::BoundingBox;

/// One object found in a frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub class_id: usize,
    pub bbox: BoundingBox,
    pub confidence: f64,
}

impl Detection {
    pub fn new(class_id: usize, bbox: BoundingBox, confidence: f64) -> Self {
        Self {
            class_id,
            bbox,
            confidence,
        }
    }
}

/// Greedy per-class non-maximum suppression.
///
/// Sorts by confidence descending and drops any detection whose IoU with an
/// already-kept detection of the same class exceeds `iou_threshold`.
pub fn non_max_suppression(mut detections: Vec<Detection>, iou_threshold: f64) -> Vec<Detection> {
    detections.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep: Vec<Detection> = Vec::with_capacity(detections.len());
    for det in detections {
        let suppressed = keep
            .iter()
            .any(|k| k.class_id == det.class_id && k.bbox.iou(&det.bbox) > iou_threshold);
        if !suppressed {
            keep.push(det);
        }
    }
    keep
}
