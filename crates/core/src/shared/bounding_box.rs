/// Axis-aligned box in frame pixel coordinates, stored as corners.
///
/// Coordinates may lie outside the frame (detections near an edge);
/// [`BoundingBox::clamp_to`] produces the visible integer rectangle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

/// Integer rectangle fully inside a frame: top-left corner plus size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Builds a box from YOLO-style center/size coordinates.
    pub fn from_center(cx: f64, cy: f64, w: f64, h: f64) -> Self {
        Self {
            x1: cx - w / 2.0,
            y1: cy - h / 2.0,
            x2: cx + w / 2.0,
            y2: cy + h / 2.0,
        }
    }

    pub fn width(&self) -> f64 {
        (self.x2 - self.x1).max(0.0)
    }

    pub fn height(&self) -> f64 {
        (self.y2 - self.y1).max(0.0)
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn iou(&self, other: &BoundingBox) -> f64 {
        let ix1 = self.x1.max(other.x1);
        let iy1 = self.y1.max(other.y1);
        let ix2 = self.x2.min(other.x2);
        let iy2 = self.y2.min(other.y2);

        let inter = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
        if inter == 0.0 {
            return 0.0;
        }
        inter / (self.area() + other.area() - inter)
    }

    /// Clips the box to a `frame_width` x `frame_height` frame.
    ///
    /// Returns `None` when nothing of the box is visible.
    pub fn clamp_to(&self, frame_width: u32, frame_height: u32) -> Option<PixelRect> {
        let fw = frame_width as f64;
        let fh = frame_height as f64;
        let x1 = self.x1.round().clamp(0.0, fw);
        let y1 = self.y1.round().clamp(0.0, fh);
        let x2 = self.x2.round().clamp(0.0, fw);
        let y2 = self.y2.round().clamp(0.0, fh);

        if x2 <= x1 || y2 <= y1 {
            return None;
        }
        Some(PixelRect {
            x: x1 as u32,
            y: y1 as u32,
            width: (x2 - x1) as u32,
            height: (y2 - y1) as u32,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn bbox(x: f64, y: f64, w: f64, h: f64) -> BoundingBox {
        BoundingBox::new(x, y, x + w, y + h)
    }

    // ── IoU ──────────────────────────────────────────────────────────

    #[test]
    fn test_iou_identical_boxes() {
        let a = bbox(10.0, 10.0, 100.0, 100.0);
        assert_relative_eq!(a.iou(&a), 1.0);
    }

    #[test]
    fn test_iou_no_overlap() {
        let a = bbox(0.0, 0.0, 50.0, 50.0);
        let b = bbox(100.0, 100.0, 50.0, 50.0);
        assert_relative_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn test_iou_partial_overlap() {
        // intersection 50*100 = 5000, union 10000 + 10000 - 5000 = 15000
        let a = bbox(0.0, 0.0, 100.0, 100.0);
        let b = bbox(50.0, 0.0, 100.0, 100.0);
        assert_relative_eq!(a.iou(&b), 5000.0 / 15000.0);
    }

    #[test]
    fn test_iou_contained() {
        let a = bbox(0.0, 0.0, 100.0, 100.0);
        let b = bbox(25.0, 25.0, 50.0, 50.0);
        assert_relative_eq!(a.iou(&b), 2500.0 / 10000.0);
    }

    #[rstest]
    #[case::touching_edges(bbox(0.0, 0.0, 50.0, 50.0), bbox(50.0, 0.0, 50.0, 50.0), 0.0)]
    #[case::zero_width(bbox(0.0, 0.0, 0.0, 100.0), bbox(0.0, 0.0, 50.0, 50.0), 0.0)]
    #[case::zero_height(bbox(0.0, 0.0, 100.0, 0.0), bbox(0.0, 0.0, 50.0, 50.0), 0.0)]
    fn test_iou_degenerate(#[case] a: BoundingBox, #[case] b: BoundingBox, #[case] expected: f64) {
        assert_relative_eq!(a.iou(&b), expected);
    }

    // ── Geometry ─────────────────────────────────────────────────────

    #[test]
    fn test_from_center() {
        let b = BoundingBox::from_center(50.0, 40.0, 20.0, 10.0);
        assert_relative_eq!(b.x1, 40.0);
        assert_relative_eq!(b.y1, 35.0);
        assert_relative_eq!(b.x2, 60.0);
        assert_relative_eq!(b.y2, 45.0);
        assert_relative_eq!(b.area(), 200.0);
    }

    #[test]
    fn test_inverted_box_has_zero_area() {
        let b = BoundingBox::new(10.0, 10.0, 5.0, 5.0);
        assert_relative_eq!(b.area(), 0.0);
    }

    // ── Clamping ─────────────────────────────────────────────────────

    #[test]
    fn test_clamp_inside_frame_is_unchanged() {
        let rect = bbox(10.0, 20.0, 30.0, 40.0).clamp_to(100, 100).unwrap();
        assert_eq!(
            rect,
            PixelRect {
                x: 10,
                y: 20,
                width: 30,
                height: 40
            }
        );
    }

    #[test]
    fn test_clamp_clips_at_edges() {
        let rect = BoundingBox::new(-20.0, -5.0, 50.0, 130.0)
            .clamp_to(100, 100)
            .unwrap();
        assert_eq!(
            rect,
            PixelRect {
                x: 0,
                y: 0,
                width: 50,
                height: 100
            }
        );
    }

    #[test]
    fn test_clamp_outside_frame_is_none() {
        assert!(bbox(200.0, 200.0, 10.0, 10.0).clamp_to(100, 100).is_none());
        assert!(bbox(-50.0, 0.0, 20.0, 10.0).clamp_to(100, 100).is_none());
    }
}
