//! COCO annotation file types and the indexed store built on top of them.
//!
//! Format specification: https://cocodataset.org/#format-data
//!
//! The test-dev index (`image_info_test-dev2017.json`) only carries `images` and `categories`;
//! `annotations` is optional so the same types read both that file and a regular instances file.

use crate::error::{DatasetError, DatasetResult};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Top-level COCO annotation file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Dataset {
    #[serde(default)]
    pub info: Option<Info>,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub categories: Vec<Category>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Info {
    #[serde(default)]
    pub year: Option<u32>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Image {
    pub id: u64,
    pub file_name: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
}

/// One object instance. `bbox` is `[x, y, width, height]` in pixels.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Annotation {
    #[serde(default)]
    pub id: u64,
    pub image_id: u64,
    pub category_id: u64,
    pub bbox: [f64; 4],
    #[serde(default)]
    pub area: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_iscrowd")]
    pub iscrowd: bool,
}

fn deserialize_iscrowd<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IsCrowd {
        Bool(bool),
        Int(u8),
    }
    match IsCrowd::deserialize(deserializer)? {
        IsCrowd::Bool(b) => Ok(b),
        IsCrowd::Int(i) => Ok(i != 0),
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Category {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub supercategory: Option<String>,
}

/// Read access to a COCO-style annotation index.
///
/// The dataset only ever reads through this trait, so anything that can answer these queries
/// (an in-memory fixture, a different file layout) can stand in for [`Coco`].
pub trait AnnotationStore {
    /// Every image id in the store, sorted ascending.
    fn image_ids(&self) -> Vec<u64>;

    /// Every category id in the store, sorted ascending. A malformed file may list an id more
    /// than once; it is returned as often as it appears.
    fn category_ids(&self) -> Vec<u64>;

    /// Category records for `ids`, in the order requested. Unknown ids are skipped.
    fn load_cats(&self, ids: &[u64]) -> Vec<&Category>;

    fn get_img(&self, id: u64) -> Option<&Image>;

    /// Annotations for one image in file order. An image without annotations yields an
    /// empty vector.
    fn annotations_for_image(&self, image_id: u64) -> Vec<&Annotation>;
}

/// A loaded COCO annotation file with lookup indices.
pub struct Coco {
    pub dataset: Dataset,
    /// img_id -> index into dataset.images
    imgs: HashMap<u64, usize>,
    /// cat_id -> index into dataset.categories
    cats: HashMap<u64, usize>,
    /// img_id -> indices into dataset.annotations, in file order
    img_to_anns: HashMap<u64, Vec<usize>>,
}

impl Coco {
    /// Load a COCO annotation JSON file and build indices.
    pub fn new(annotation_file: &Path) -> DatasetResult<Self> {
        let file =
            File::open(annotation_file).map_err(|e| DatasetError::io(annotation_file, e))?;
        let dataset: Dataset =
            serde_json::from_reader(BufReader::new(file)).map_err(|source| DatasetError::Json {
                path: annotation_file.to_path_buf(),
                source,
            })?;
        log::debug!(
            "loaded {}: {} images, {} annotations, {} categories",
            annotation_file.display(),
            dataset.images.len(),
            dataset.annotations.len(),
            dataset.categories.len()
        );
        Ok(Coco::from_dataset(dataset))
    }

    pub fn from_dataset(dataset: Dataset) -> Self {
        let imgs = dataset
            .images
            .iter()
            .enumerate()
            .map(|(i, img)| (img.id, i))
            .collect();
        let cats = dataset
            .categories
            .iter()
            .enumerate()
            .map(|(i, cat)| (cat.id, i))
            .collect();
        let mut img_to_anns: HashMap<u64, Vec<usize>> = HashMap::new();
        for (i, ann) in dataset.annotations.iter().enumerate() {
            img_to_anns.entry(ann.image_id).or_default().push(i);
        }
        Coco {
            dataset,
            imgs,
            cats,
            img_to_anns,
        }
    }
}

impl AnnotationStore for Coco {
    fn image_ids(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self.dataset.images.iter().map(|img| img.id).collect();
        ids.sort_unstable();
        ids
    }

    fn category_ids(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self.dataset.categories.iter().map(|cat| cat.id).collect();
        ids.sort_unstable();
        ids
    }

    fn load_cats(&self, ids: &[u64]) -> Vec<&Category> {
        ids.iter()
            .filter_map(|id| self.cats.get(id).map(|&i| &self.dataset.categories[i]))
            .collect()
    }

    fn get_img(&self, id: u64) -> Option<&Image> {
        self.imgs.get(&id).map(|&i| &self.dataset.images[i])
    }

    fn annotations_for_image(&self, image_id: u64) -> Vec<&Annotation> {
        self.img_to_anns
            .get(&image_id)
            .map(|indices| {
                indices
                    .iter()
                    .map(|&i| &self.dataset.annotations[i])
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_DEV_JSON: &str = r#"{
        "info": {"year": 2017, "version": "1.0", "description": "COCO 2017 test-dev"},
        "images": [
            {"id": 42, "file_name": "000000000042.jpg", "width": 640, "height": 480},
            {"id": 7, "file_name": "000000000007.jpg", "width": 320, "height": 240}
        ],
        "categories": [
            {"id": 18, "name": "dog", "supercategory": "animal"},
            {"id": 1, "name": "person", "supercategory": "person"}
        ]
    }"#;

    fn annotated_dataset() -> Dataset {
        let mut dataset: Dataset = serde_json::from_str(TEST_DEV_JSON).unwrap();
        dataset.annotations = serde_json::from_str(
            r#"[
                {"id": 3, "image_id": 42, "category_id": 18, "bbox": [1, 2, 3, 4], "iscrowd": 0},
                {"id": 1, "image_id": 42, "category_id": 1, "bbox": [5, 6, 7, 8], "iscrowd": 1},
                {"id": 2, "image_id": 7, "category_id": 1, "bbox": [0, 0, 9, 9]}
            ]"#,
        )
        .unwrap();
        dataset
    }

    #[test]
    fn parses_test_dev_index_without_annotations() {
        let dataset: Dataset = serde_json::from_str(TEST_DEV_JSON).unwrap();
        assert_eq!(dataset.images.len(), 2);
        assert_eq!(dataset.categories.len(), 2);
        assert!(dataset.annotations.is_empty());
    }

    #[test]
    fn ids_are_sorted() {
        let coco = Coco::from_dataset(annotated_dataset());
        assert_eq!(coco.image_ids(), vec![7, 42]);
        assert_eq!(coco.category_ids(), vec![1, 18]);
    }

    #[test]
    fn annotations_keep_file_order() {
        let coco = Coco::from_dataset(annotated_dataset());
        let ids: Vec<u64> = coco
            .annotations_for_image(42)
            .iter()
            .map(|ann| ann.id)
            .collect();
        assert_eq!(ids, vec![3, 1]);
        assert!(coco.annotations_for_image(42)[1].iscrowd);
        assert!(coco.annotations_for_image(1234).is_empty());
    }

    #[test]
    fn load_cats_skips_unknown_ids() {
        let coco = Coco::from_dataset(annotated_dataset());
        let names: Vec<&str> = coco
            .load_cats(&[18, 99, 1])
            .iter()
            .map(|cat| cat.name.as_str())
            .collect();
        assert_eq!(names, vec!["dog", "person"]);
    }

    #[test]
    fn get_img_by_id() {
        let coco = Coco::from_dataset(annotated_dataset());
        assert_eq!(coco.get_img(7).unwrap().file_name, "000000000007.jpg");
        assert!(coco.get_img(8).is_none());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = Coco::new(Path::new("does/not/exist.json")).err().unwrap();
        assert!(matches!(err, DatasetError::Io { .. }));
    }
}
