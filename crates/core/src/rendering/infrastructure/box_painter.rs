use ndarray::s;

use crate::detection::domain::detection::Detection;
use crate::shared::constants::{DEFAULT_BOX_COLOR, DEFAULT_BOX_THICKNESS};
use crate::shared::frame::Frame;

/// Draws hollow rectangles around detections, directly into RGB pixels.
///
/// Boxes are clipped to the frame; a box thinner than the outline is
/// filled solid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoxPainter {
    color: [u8; 3],
    thickness: u32,
}

impl BoxPainter {
    pub fn new(color: [u8; 3], thickness: u32) -> Self {
        Self {
            color,
            thickness: thickness.max(1),
        }
    }

    pub fn paint(&self, frame: &mut Frame, detections: &[Detection]) {
        if frame.channels() < 3 {
            return;
        }
        let (fw, fh) = (frame.width(), frame.height());
        let mut pixels = frame.as_ndarray_mut();

        for det in detections {
            let Some(rect) = det.bbox.clamp_to(fw, fh) else {
                continue;
            };
            let x0 = rect.x as usize;
            let y0 = rect.y as usize;
            let x1 = x0 + rect.width as usize;
            let y1 = y0 + rect.height as usize;
            let t = self.thickness as usize;

            // (rows, cols) of the top, bottom, left and right edges
            let bands = [
                (y0, (y0 + t).min(y1), x0, x1),
                (y1.saturating_sub(t).max(y0), y1, x0, x1),
                (y0, y1, x0, (x0 + t).min(x1)),
                (y0, y1, x1.saturating_sub(t).max(x0), x1),
            ];
            for (ya, yb, xa, xb) in bands {
                for (c, value) in self.color.iter().enumerate() {
                    pixels.slice_mut(s![ya..yb, xa..xb, c]).fill(*value);
                }
            }
        }
    }
}

impl Default for BoxPainter {
    fn default() -> Self {
        Self::new(DEFAULT_BOX_COLOR, DEFAULT_BOX_THICKNESS)
    }
}
