use crate::annotations::bounding_box::DEFAULT_BOX_EPSILON;
use crate::error::{DatasetError, DatasetResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Named partitions this dataset knows how to read.
///
/// Only the test-dev images are published without ground truth, so this is the only split
/// the loader accepts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Split {
    #[default]
    Test2017,
}

impl Split {
    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Test2017 => "test2017",
        }
    }

    /// Name of the annotation index file for this split, inside `<root>/annotations`.
    pub fn annotation_file_name(&self) -> &'static str {
        match self {
            Split::Test2017 => "image_info_test-dev2017.json",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Split {
    type Err = DatasetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "test2017" => Ok(Split::Test2017),
            other => Err(DatasetError::InvalidConfig(format!(
                "unrecognized split '{}', expected 'test2017'",
                other
            ))),
        }
    }
}

impl TryFrom<String> for Split {
    type Error = DatasetError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Split> for String {
    fn from(split: Split) -> Self {
        split.as_str().to_string()
    }
}

/// Everything needed to construct a [`CocoTestDevDataset`](crate::dataset::CocoTestDevDataset).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Directory holding `images/` and `annotations/`.
    pub root: PathBuf,
    pub split: Split,
    /// Side length every image is resized to.
    pub resize: u32,
    /// Fetch and extract the archives on construction if they are not already there.
    pub download: bool,
    /// Delete the `.zip` files once they have been extracted.
    pub remove_compressed_files: bool,
    /// Boxes are clamped into `[box_epsilon, 1 - box_epsilon]`.
    pub box_epsilon: f32,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        DatasetConfig {
            root: PathBuf::from("data/coco"),
            split: Split::Test2017,
            resize: 416,
            download: true,
            remove_compressed_files: true,
            box_epsilon: DEFAULT_BOX_EPSILON,
        }
    }
}

impl DatasetConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DatasetConfig {
            root: root.into(),
            ..DatasetConfig::default()
        }
    }

    /// Reads a JSON config file. Missing fields take their default values.
    pub fn from_json_file(path: &Path) -> DatasetResult<Self> {
        let file = File::open(path).map_err(|e| DatasetError::io(path, e))?;
        serde_json::from_reader(BufReader::new(file)).map_err(|source| DatasetError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> DatasetResult<()> {
        if self.resize == 0 {
            return Err(DatasetError::InvalidConfig(
                "resize must be a positive number of pixels".to_string(),
            ));
        }
        if !(0.0..0.5).contains(&self.box_epsilon) {
            return Err(DatasetError::InvalidConfig(format!(
                "box_epsilon must be in [0, 0.5), got {}",
                self.box_epsilon
            )));
        }
        Ok(())
    }

    pub fn image_dir(&self) -> PathBuf {
        self.root.join("images").join(self.split.as_str())
    }

    pub fn annotation_path(&self) -> PathBuf {
        self.root
            .join("annotations")
            .join(self.split.annotation_file_name())
    }
}
