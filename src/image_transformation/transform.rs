//! The geometric transform applied to every sample: square resize, optional train-time flip,
//! tensor conversion and ImageNet normalization.

use crate::error::{DatasetError, DatasetResult};
use crate::image_utils::image_conversion::{
    IMAGENET_MEAN, IMAGENET_STD, convert_rgb_image_to_owned_array, normalize_channels,
};
use image::RgbImage;
use image::imageops::FilterType;
use ndarray::{Array1, Array2, Array3, Axis};
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformMode {
    /// Resize plus random augmentation.
    Train,
    /// Deterministic resize only.
    Eval,
}

/// Output of [`Transform::apply`].
#[derive(Debug, Clone, PartialEq)]
pub struct TransformOutput {
    /// `(3, size, size)`, ImageNet-normalized.
    pub image: Array3<f32>,
    /// `[N, 4]` corner-form boxes in normalized `[0, 1]` image coordinates.
    pub boxes: Array2<f32>,
    pub labels: Array1<i64>,
}

#[derive(Debug, Clone)]
pub struct Transform {
    pub mode: TransformMode,
    /// Side length of the square output image.
    pub size: u32,
    /// Probability of a horizontal flip. Only used in train mode.
    pub flip_horizontal_prob: f32,
    /// Makes train-time augmentation reproducible per sample when set.
    pub seed: Option<u64>,
}

impl Transform {
    pub fn eval(size: u32) -> Self {
        Transform {
            mode: TransformMode::Eval,
            size,
            flip_horizontal_prob: 0.0,
            seed: None,
        }
    }

    pub fn train(size: u32, flip_horizontal_prob: f32) -> Self {
        Transform {
            mode: TransformMode::Train,
            size,
            flip_horizontal_prob,
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Resizes `image` to `size x size` and maps `boxes` (pixel coordinates of the original
    /// image) into normalized coordinates of the output.
    ///
    /// `key` identifies the sample; with a seed set, the same key always gets the same
    /// augmentation. The number and order of boxes and labels never change.
    pub fn apply(
        &self,
        image: RgbImage,
        boxes: Array2<f32>,
        labels: Array1<i64>,
        key: u64,
    ) -> DatasetResult<TransformOutput> {
        if boxes.nrows() != labels.len() {
            return Err(DatasetError::MisalignedAnnotations {
                boxes: boxes.nrows(),
                labels: labels.len(),
            });
        }
        let (width, height) = image.dimensions();
        let mut boxes = boxes;
        for (col, mut column) in boxes.axis_iter_mut(Axis(1)).enumerate() {
            let extent = if col % 2 == 0 { width } else { height };
            column.mapv_inplace(|v| v / extent as f32);
        }

        let mut resized = image::imageops::resize(&image, self.size, self.size, FilterType::Triangle);

        if self.mode == TransformMode::Train {
            let mut rng = match self.seed {
                Some(seed) => rand::rngs::StdRng::seed_from_u64(seed ^ key),
                None => rand::rngs::StdRng::from_rng(&mut rand::rng()),
            };
            maybe_hflip(&mut resized, &mut boxes, self.flip_horizontal_prob, &mut rng);
        }

        let mut image = convert_rgb_image_to_owned_array(&resized);
        normalize_channels(&mut image, IMAGENET_MEAN, IMAGENET_STD);
        Ok(TransformOutput {
            image,
            boxes,
            labels,
        })
    }
}

/// Flips the image and its normalized boxes left to right with probability `prob`.
pub(crate) fn maybe_hflip(
    img: &mut RgbImage,
    boxes: &mut Array2<f32>,
    prob: f32,
    rng: &mut dyn rand::RngCore,
) {
    if prob <= 0.0 {
        return;
    }
    if rng.random_range(0.0..1.0) < prob {
        image::imageops::flip_horizontal_in_place(img);
        for mut b in boxes.rows_mut() {
            let x0 = b[0];
            let x1 = b[2];
            b[0] = 1.0 - x1;
            b[2] = 1.0 - x0;
        }
    }
}
