use crate::annotations::bounding_box::clamp_box_coordinates;
use crate::annotations::category_index::CategoryIndex;
use crate::annotations::coco::{AnnotationStore, Coco};
use crate::annotations::normalize::make_det_annos;
use crate::dataset::collate::{Batch, Sample, collate};
use crate::dataset::config::DatasetConfig;
use crate::dataset::download::download_coco_for_test;
use crate::dataset::loader::{Batches, DetectionDataset};
use crate::error::{DatasetError, DatasetResult};
use crate::image_transformation::transform::Transform;
use crate::image_utils::image_io::read_image_as_rgb8;
use log::{debug, info};

/// The COCO test-dev2017 split as an indexable detection dataset.
///
/// The image id list and the category mapping are fixed at construction. Every call to
/// [`get`](CocoTestDevDataset::get) reads the image from disk and rebuilds the sample from
/// scratch; nothing is cached between calls.
pub struct CocoTestDevDataset<S: AnnotationStore = Coco> {
    config: DatasetConfig,
    store: S,
    image_ids: Vec<u64>,
    categories: CategoryIndex,
    transform: Transform,
}

impl CocoTestDevDataset<Coco> {
    /// Downloads the split if asked to, then loads the annotation index from
    /// `<root>/annotations`.
    pub fn new(config: DatasetConfig) -> DatasetResult<Self> {
        config.validate()?;
        if config.download {
            download_coco_for_test(&config.root, config.remove_compressed_files)?;
        }
        let store = Coco::new(&config.annotation_path())?;
        CocoTestDevDataset::from_store(config, store)
    }
}

impl<S: AnnotationStore> CocoTestDevDataset<S> {
    /// Builds the dataset over an already loaded annotation store. Never downloads.
    pub fn from_store(config: DatasetConfig, store: S) -> DatasetResult<Self> {
        config.validate()?;
        let image_ids = store.image_ids();
        let category_ids = store.category_ids();
        let categories = CategoryIndex::from_categories(&store.load_cats(&category_ids))?;
        let transform = Transform::eval(config.resize);
        info!(
            "COCO {}: {} images, {} categories, resize {}",
            config.split,
            image_ids.len(),
            categories.len(),
            config.resize
        );
        Ok(CocoTestDevDataset {
            config,
            store,
            image_ids,
            categories,
            transform,
        })
    }

    pub fn len(&self) -> usize {
        self.image_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.image_ids.is_empty()
    }

    pub fn config(&self) -> &DatasetConfig {
        &self.config
    }

    pub fn categories(&self) -> &CategoryIndex {
        &self.categories
    }

    /// Human-readable name of a dense label.
    pub fn class_name(&self, dense: usize) -> Option<&str> {
        self.categories.dense_name(dense)
    }

    /// COCO image id behind a dataset index.
    pub fn image_id(&self, index: usize) -> DatasetResult<u64> {
        self.image_ids
            .get(index)
            .copied()
            .ok_or(DatasetError::IndexOutOfRange {
                index,
                len: self.image_ids.len(),
            })
    }

    pub fn get(&self, index: usize) -> DatasetResult<Sample> {
        let image_id = self.image_id(index)?;
        let record = self
            .store
            .get_img(image_id)
            .ok_or(DatasetError::MissingImageRecord { image_id })?;
        let image = read_image_as_rgb8(&self.config.image_dir().join(&record.file_name))?;

        let annotations = self.store.annotations_for_image(image_id);
        let normalized = make_det_annos(&annotations, &self.categories)?;
        if normalized.dropped > 0 {
            debug!(
                "image {}: dropped {} degenerate box(es)",
                image_id, normalized.dropped
            );
        }

        let out = self.transform.apply(
            image,
            normalized.boxes_array(),
            normalized.labels_array(),
            image_id,
        )?;
        let mut boxes = out.boxes;
        clamp_box_coordinates(&mut boxes, self.config.box_epsilon);
        Ok(Sample {
            image: out.image,
            boxes,
            labels: out.labels,
        })
    }

    pub fn collate(&self, samples: Vec<Sample>) -> DatasetResult<Batch> {
        collate(samples)
    }

    /// Batches over the whole dataset in index order.
    pub fn batches(&self, batch_size: usize) -> Batches<'_, Self> {
        Batches::new(self, batch_size)
    }
}

impl<S: AnnotationStore> DetectionDataset for CocoTestDevDataset<S> {
    fn len(&self) -> usize {
        CocoTestDevDataset::len(self)
    }

    fn get(&self, index: usize) -> DatasetResult<Sample> {
        CocoTestDevDataset::get(self, index)
    }
}
