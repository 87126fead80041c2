//! Error type shared by every stage of the dataset.

use std::path::PathBuf;
use thiserror::Error;

pub type DatasetResult<T> = Result<T, DatasetError>;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("invalid category data: {reason}")]
    InvalidCategoryData { reason: String },
    #[error("unknown category id {sparse_id}")]
    UnknownCategory { sparse_id: u64 },
    #[error("index {index} out of range for dataset of length {len}")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("no image record for image id {image_id}")]
    MissingImageRecord { image_id: u64 },
    #[error("failed to load image {path}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("sample {index} has image shape {found:?}, expected {expected:?}")]
    ShapeMismatch {
        index: usize,
        expected: Vec<usize>,
        found: Vec<usize>,
    },
    #[error("cannot collate an empty list of samples")]
    EmptyBatch,
    #[error("{boxes} boxes do not line up with {labels} labels")]
    MisalignedAnnotations { boxes: usize, labels: usize },
    #[error("tensor shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
    #[error("failed to fetch {url}: {source}")]
    ArchiveFetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to extract archive {path}: {source}")]
    ArchiveExtract {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("json parse error at {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl DatasetError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DatasetError::Io {
            path: path.into(),
            source,
        }
    }
}
