pub mod coco_test_dev;
pub mod collate;
pub mod config;
pub mod download;
pub mod loader;

pub use coco_test_dev::CocoTestDevDataset;
pub use collate::{Batch, Sample, collate};
pub use config::{DatasetConfig, Split};
pub use loader::{Batches, DetectionDataset};
