use crate::error::{DatasetError, DatasetResult};
use ndarray::{Array1, Array2, Array3, Array4, ArrayView3, Axis};

/// One image with its boxes and labels, ready for a detector.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// `(3, R, R)`, ImageNet-normalized.
    pub image: Array3<f32>,
    /// `[N, 4]` corner-form boxes, normalized and clamped.
    pub boxes: Array2<f32>,
    /// `[N]` dense labels.
    pub labels: Array1<i64>,
}

impl Sample {
    pub fn num_boxes(&self) -> usize {
        self.boxes.nrows()
    }
}

/// Several samples combined: images stacked, boxes and labels left as per-image lists.
///
/// Images differ in how many objects they hold, so the box and label tensors are not padded;
/// `boxes[i]` and `labels[i]` belong to `images[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// `(B, 3, R, R)`
    pub images: Array4<f32>,
    pub boxes: Vec<Array2<f32>>,
    pub labels: Vec<Array1<i64>>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.images.len_of(Axis(0))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Stacks sample images along a new leading axis and keeps boxes/labels in input order.
///
/// Every image must have the same shape as the first one.
pub fn collate(samples: Vec<Sample>) -> DatasetResult<Batch> {
    let Some(first) = samples.first() else {
        return Err(DatasetError::EmptyBatch);
    };
    let expected = first.image.shape().to_vec();
    for (index, sample) in samples.iter().enumerate() {
        if sample.image.shape() != expected.as_slice() {
            return Err(DatasetError::ShapeMismatch {
                index,
                expected,
                found: sample.image.shape().to_vec(),
            });
        }
    }
    let views: Vec<ArrayView3<f32>> = samples.iter().map(|s| s.image.view()).collect();
    let images = ndarray::stack(Axis(0), &views)?;
    let (boxes, labels) = samples.into_iter().map(|s| (s.boxes, s.labels)).unzip();
    Ok(Batch {
        images,
        boxes,
        labels,
    })
}
