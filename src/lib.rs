//! COCO test-dev2017 as a detection dataset.
//!
//! Downloads the test2017 images and the test-dev annotation index, then serves one sample per
//! image: a resized, ImageNet-normalized `(3, R, R)` tensor, corner-form boxes in normalized
//! coordinates, and COCO categories remapped to dense labels `0..80`. Samples can be collated
//! into batches that stack the images and keep boxes and labels as per-image lists.
//!
//! ```no_run
//! use coco_test_dev::{CocoTestDevDataset, DatasetConfig};
//!
//! let dataset = CocoTestDevDataset::new(DatasetConfig::new("data/coco"))?;
//! for batch in dataset.batches(8) {
//!     let batch = batch?;
//!     println!("{:?}", batch.images.shape());
//! }
//! # Ok::<(), coco_test_dev::DatasetError>(())
//! ```

pub mod annotations;
pub mod dataset;
pub mod error;
pub mod image_transformation;
pub mod image_utils;

pub use annotations::category_index::CategoryIndex;
pub use annotations::coco::{AnnotationStore, Coco};
pub use dataset::{
    Batch, Batches, CocoTestDevDataset, DatasetConfig, DetectionDataset, Sample, Split, collate,
};
pub use error::{DatasetError, DatasetResult};
