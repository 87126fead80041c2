use crate::annotations::bounding_box::{BoundingBox, BoundingBoxGeometry};
use crate::annotations::category_index::CategoryIndex;
use crate::annotations::coco::Annotation;
use crate::error::DatasetResult;
use ndarray::{Array1, Array2};

/// Boxes narrower or shorter than this many pixels are dropped.
pub const MIN_BOX_SIDE_PX: f64 = 1.0;

/// Detection-ready annotations for one image: corner-form pixel boxes and dense labels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedAnnotations {
    pub boxes: Vec<BoundingBox>,
    pub labels: Vec<usize>,
    /// How many raw annotations were dropped as degenerate.
    pub dropped: usize,
}

impl NormalizedAnnotations {
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// `[N, 4]` tensor of `(x1, y1, x2, y2)` rows.
    pub fn boxes_array(&self) -> Array2<f32> {
        Array2::from_shape_fn((self.boxes.len(), 4), |(row, col)| {
            self.boxes[row].as_xyxy()[col]
        })
    }

    pub fn labels_array(&self) -> Array1<i64> {
        self.labels.iter().map(|&label| label as i64).collect()
    }

    /// `[N, 5]` tensor of `(x1, y1, x2, y2, label)` rows.
    pub fn to_rows(&self) -> Array2<f32> {
        Array2::from_shape_fn((self.boxes.len(), 5), |(row, col)| match col {
            4 => self.labels[row] as f32,
            _ => self.boxes[row].as_xyxy()[col],
        })
    }
}

/// Converts raw COCO annotations into corner-form boxes with dense labels.
///
/// Annotations whose width or height is below one pixel are skipped; a box exactly one pixel
/// wide is kept. Kept annotations stay in their original order. An image with no usable
/// annotations gives an empty set rather than an error.
pub fn make_det_annos(
    annotations: &[&Annotation],
    categories: &CategoryIndex,
) -> DatasetResult<NormalizedAnnotations> {
    let mut normalized = NormalizedAnnotations::default();
    for annotation in annotations {
        let [_, _, w, h] = annotation.bbox;
        if w < MIN_BOX_SIDE_PX || h < MIN_BOX_SIDE_PX {
            normalized.dropped += 1;
            continue;
        }
        let label = categories.to_dense(annotation.category_id)?;
        normalized.boxes.push(BoundingBox::from_xywh(annotation.bbox));
        normalized.labels.push(label);
    }
    Ok(normalized)
}
