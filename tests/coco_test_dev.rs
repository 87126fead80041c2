use coco_test_dev::image_utils::image_conversion::to_preview_image;
use coco_test_dev::{CocoTestDevDataset, DatasetConfig, DatasetError, DetectionDataset};
use image::{GrayImage, Luma, Rgb, RgbImage};
use ndarray::array;
use std::fs;
use std::path::Path;

const RESIZE: u32 = 32;

// Image 7 is a 20x10 grayscale picture with three annotations (one too thin to keep),
// image 42 is an 8x8 RGB picture with none, image 50 points at a file that does not exist.
const ANNOTATIONS: &str = r#"{
    "info": {"year": 2017, "description": "fixture"},
    "images": [
        {"id": 42, "file_name": "000000000042.png", "width": 8, "height": 8},
        {"id": 7, "file_name": "000000000007.png", "width": 20, "height": 10},
        {"id": 50, "file_name": "000000000050.png", "width": 8, "height": 8}
    ],
    "categories": [
        {"id": 1, "name": "person", "supercategory": "person"},
        {"id": 3, "name": "car", "supercategory": "vehicle"},
        {"id": 18, "name": "dog", "supercategory": "animal"}
    ],
    "annotations": [
        {"id": 1, "image_id": 7, "category_id": 18, "bbox": [2, 1, 10, 4], "iscrowd": 0},
        {"id": 2, "image_id": 7, "category_id": 1, "bbox": [5, 5, 0.5, 3], "iscrowd": 0},
        {"id": 3, "image_id": 7, "category_id": 3, "bbox": [0, 0, 20, 10], "iscrowd": 0}
    ]
}"#;

fn write_fixture(root: &Path) {
    let image_dir = root.join("images/test2017");
    let anno_dir = root.join("annotations");
    fs::create_dir_all(&image_dir).unwrap();
    fs::create_dir_all(&anno_dir).unwrap();
    GrayImage::from_pixel(20, 10, Luma([128]))
        .save(image_dir.join("000000000007.png"))
        .unwrap();
    RgbImage::from_pixel(8, 8, Rgb([255, 0, 0]))
        .save(image_dir.join("000000000042.png"))
        .unwrap();
    fs::write(anno_dir.join("image_info_test-dev2017.json"), ANNOTATIONS).unwrap();
}

fn open(root: &Path) -> CocoTestDevDataset {
    let config = DatasetConfig {
        resize: RESIZE,
        download: false,
        ..DatasetConfig::new(root)
    };
    CocoTestDevDataset::new(config).unwrap()
}

#[test]
fn length_matches_image_index() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());
    let dataset = open(dir.path());
    assert_eq!(dataset.len(), 3);
    assert_eq!(DetectionDataset::len(&dataset), 3);
    assert_eq!(dataset.image_id(0).unwrap(), 7);
    assert_eq!(dataset.image_id(1).unwrap(), 42);
    assert_eq!(dataset.categories().len(), 3);
}

#[test]
fn sample_has_resized_image_and_normalized_boxes() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());
    let dataset = open(dir.path());

    let sample = dataset.get(0).unwrap();
    assert_eq!(sample.image.dim(), (3, RESIZE as usize, RESIZE as usize));
    assert_eq!(sample.num_boxes(), 2);
    // dog (18) -> 2, car (3) -> 1
    assert_eq!(sample.labels, array![2_i64, 1]);

    // (2, 1, 12, 5) on a 20x10 image, then the full-image box clamped to [1e-3, 1 - 1e-3].
    let expected = array![[0.1_f32, 0.1, 0.6, 0.5], [0.001, 0.001, 0.999, 0.999]];
    for (a, b) in sample.boxes.iter().zip(expected.iter()) {
        assert!((a - b).abs() < 1e-6, "{} != {}", a, b);
    }
    assert!(sample.boxes.iter().all(|&v| (0.001..=0.999).contains(&v)));
}

#[test]
fn grayscale_source_becomes_three_equal_channels() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());
    let dataset = open(dir.path());

    let preview = to_preview_image(dataset.get(0).unwrap().image.view());
    assert_eq!(preview.dimensions(), (RESIZE, RESIZE));
    for pixel in preview.pixels() {
        let [r, g, b] = pixel.0;
        assert!(r.abs_diff(128) <= 1 && g.abs_diff(128) <= 1 && b.abs_diff(128) <= 1);
    }
}

#[test]
fn image_without_annotations_gives_empty_tensors() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());
    let dataset = open(dir.path());

    let sample = dataset.get(1).unwrap();
    assert_eq!(sample.boxes.dim(), (0, 4));
    assert_eq!(sample.labels.len(), 0);
}

#[test]
fn missing_image_and_bad_index_fail() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());
    let dataset = open(dir.path());

    assert!(matches!(dataset.get(2), Err(DatasetError::ImageLoad { .. })));
    assert!(matches!(
        dataset.get(3),
        Err(DatasetError::IndexOutOfRange { index: 3, len: 3 })
    ));
}

#[test]
fn collate_stacks_images_and_keeps_box_counts() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());
    let dataset = open(dir.path());

    let samples = vec![dataset.get(0).unwrap(), dataset.get(1).unwrap()];
    let batch = dataset.collate(samples).unwrap();
    assert_eq!(batch.images.shape(), &[2, 3, RESIZE as usize, RESIZE as usize]);
    assert_eq!(batch.boxes[0].nrows(), 2);
    assert_eq!(batch.boxes[1].nrows(), 0);
    assert_eq!(batch.labels[0].len(), 2);
    assert_eq!(batch.labels[1].len(), 0);
}

#[test]
fn batches_surface_the_broken_sample() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());
    let dataset = open(dir.path());

    let results: Vec<_> = dataset.batches(2).collect();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].as_ref().unwrap().len(), 2);
    assert!(matches!(results[1], Err(DatasetError::ImageLoad { .. })));
}

#[test]
fn samples_load_concurrently() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());
    let dataset = open(dir.path());

    let (first, second) = std::thread::scope(|scope| {
        let first = scope.spawn(|| dataset.get(0));
        let second = scope.spawn(|| dataset.get(1));
        (first.join().unwrap(), second.join().unwrap())
    });
    assert_eq!(first.unwrap(), dataset.get(0).unwrap());
    assert_eq!(second.unwrap().num_boxes(), 0);
}

#[test]
fn limited_batches_stop_before_the_broken_sample() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());
    let dataset = open(dir.path());

    let batches: Vec<_> = dataset.batches(8).limit(2).collect();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].as_ref().unwrap().len(), 2);
}

#[test]
fn unknown_category_fails_the_sample() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());
    let path = dir.path().join("annotations/image_info_test-dev2017.json");
    let patched = ANNOTATIONS.replace(r#""category_id": 3,"#, r#""category_id": 4,"#);
    fs::write(&path, patched).unwrap();
    let dataset = open(dir.path());

    assert!(matches!(
        dataset.get(0),
        Err(DatasetError::UnknownCategory { sparse_id: 4 })
    ));
}

#[test]
fn missing_annotation_file_fails_construction() {
    let dir = tempfile::tempdir().unwrap();
    let config = DatasetConfig {
        download: false,
        ..DatasetConfig::new(dir.path())
    };
    assert!(matches!(
        CocoTestDevDataset::new(config),
        Err(DatasetError::Io { .. })
    ));
}

#[test]
fn duplicate_categories_fail_construction() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());
    let path = dir.path().join("annotations/image_info_test-dev2017.json");
    let patched = ANNOTATIONS.replace(r#""id": 18, "name": "dog""#, r#""id": 3, "name": "dog""#);
    fs::write(&path, patched).unwrap();

    let config = DatasetConfig {
        download: false,
        ..DatasetConfig::new(dir.path())
    };
    assert!(matches!(
        CocoTestDevDataset::new(config),
        Err(DatasetError::InvalidCategoryData { .. })
    ));
}
