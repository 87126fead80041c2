use ndarray::Array2;

/// Default margin used when clamping normalized box coordinates.
pub const DEFAULT_BOX_EPSILON: f32 = 1e-3;

/// A struct representing a bounding box in corner form.
///
/// A bounding box is a rectangle used to annotate objects in images for training deep object
/// detection models. COCO stores boxes as a top-left corner plus a width and height; everything
/// downstream of the annotation store works with the two corners instead, so that is the only
/// representation this type holds.
///
/// This project uses the standard convention of the left side of the image being x=0 and the top
/// of the image being y=0.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    left: f32,
    top: f32,
    right: f32,
    bottom: f32,
}

impl BoundingBox {
    /// Builds a box from COCO's `[x, y, width, height]`.
    ///
    /// The corners are summed in f64 before narrowing so `right == x + width` holds exactly for
    /// any value that survives the conversion to f32.
    pub fn from_xywh(xywh: [f64; 4]) -> Self {
        let [x, y, w, h] = xywh;
        BoundingBox {
            left: x as f32,
            top: y as f32,
            right: (x + w) as f32,
            bottom: (y + h) as f32,
        }
    }
}

pub trait BoundingBoxGeometry {
    fn left(&self) -> f32;
    fn top(&self) -> f32;
    fn right(&self) -> f32;
    fn bottom(&self) -> f32;

    fn width(&self) -> f32 {
        self.right() - self.left()
    }

    fn height(&self) -> f32 {
        self.bottom() - self.top()
    }

    fn as_xyxy(&self) -> [f32; 4] {
        [self.left(), self.top(), self.right(), self.bottom()]
    }
}

impl BoundingBoxGeometry for BoundingBox {
    fn left(&self) -> f32 {
        self.left
    }

    fn top(&self) -> f32 {
        self.top
    }

    fn right(&self) -> f32 {
        self.right
    }

    fn bottom(&self) -> f32 {
        self.bottom
    }
}

/// Clamps every coordinate of an `[N, 4]` box tensor into `[epsilon, 1 - epsilon]`.
///
/// Exact 0 and 1 coordinates make log-space box losses blow up, so normalized boxes are pulled
/// just inside the unit square. Applying this twice gives the same result as applying it once.
pub fn clamp_box_coordinates(boxes: &mut Array2<f32>, epsilon: f32) {
    let upper = 1.0 - epsilon;
    boxes.mapv_inplace(|v| v.max(epsilon).min(upper));
}
