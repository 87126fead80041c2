//! Fetching and unpacking the COCO test-dev archives.

use crate::error::{DatasetError, DatasetResult};
use log::{debug, info};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const COCO_2017_TEST_URL: &str = "http://images.cocodataset.org/zips/test2017.zip";
pub const COCO_2017_TEST_ANNO_URL: &str =
    "http://images.cocodataset.org/annotations/image_info_test2017.zip";

/// Downloads and extracts the test2017 images and the test-dev annotation index under
/// `root_dir`.
///
/// Layout after a successful run:
/// `root_dir/images/test2017/*.jpg` and `root_dir/annotations/image_info_test*.json`.
/// Does nothing if `root_dir/images/test2017` already exists. Failures are returned as is;
/// there is no retry.
pub fn download_coco_for_test(root_dir: &Path, remove_compressed_files: bool) -> DatasetResult<()> {
    let img_dir = root_dir.join("images");
    let anno_dir = root_dir.join("annotations");
    for dir in [root_dir, img_dir.as_path(), anno_dir.as_path()] {
        fs::create_dir_all(dir).map_err(|e| DatasetError::io(dir, e))?;
    }

    if img_dir.join("test2017").exists() {
        info!("COCO test-dev already present under {}", root_dir.display());
        return Ok(());
    }

    info!("Downloading COCO test-dev into {}", root_dir.display());
    let image_zip = download_file(COCO_2017_TEST_URL, &img_dir)?;
    // The annotation archive already contains an `annotations/` folder.
    let anno_zip = download_file(COCO_2017_TEST_ANNO_URL, root_dir)?;

    unpack_archives(root_dir, &image_zip, &anno_zip)?;

    if remove_compressed_files {
        let removed = remove_archives(root_dir)? + remove_archives(&img_dir)?;
        info!("Removed {} archive(s)", removed);
    }
    info!("COCO test-dev ready");
    Ok(())
}

/// Extracts the annotation archive into `root_dir`, then the image archive into
/// `root_dir/images`.
///
/// `images/test2017` marks a finished download, so it must only appear once the annotations
/// are in place.
fn unpack_archives(root_dir: &Path, image_zip: &Path, anno_zip: &Path) -> DatasetResult<()> {
    info!("Extracting archives");
    extract_archive(anno_zip, root_dir)?;
    extract_archive(image_zip, &root_dir.join("images"))
}

/// Streams `url` into `out_dir`, naming the file after the last path segment of the URL.
pub fn download_file(url: &str, out_dir: &Path) -> DatasetResult<PathBuf> {
    let file_name = url.rsplit('/').next().unwrap_or(url);
    let destination = out_dir.join(file_name);
    let partial = out_dir.join(format!("{}.part", file_name));

    let fetch_error = |source: reqwest::Error| DatasetError::ArchiveFetch {
        url: url.to_string(),
        source,
    };
    let mut response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(fetch_error)?;
    if let Some(len) = response.content_length() {
        info!("{}: {:.1} MiB", file_name, len as f64 / (1024.0 * 1024.0));
    }
    let mut file = File::create(&partial).map_err(|e| DatasetError::io(&partial, e))?;
    let written = response.copy_to(&mut file).map_err(fetch_error)?;
    fs::rename(&partial, &destination).map_err(|e| DatasetError::io(&destination, e))?;
    debug!("wrote {} bytes to {}", written, destination.display());
    Ok(destination)
}

/// Extracts every entry of a zip archive into `dest`.
pub fn extract_archive(archive: &Path, dest: &Path) -> DatasetResult<()> {
    let file = File::open(archive).map_err(|e| DatasetError::io(archive, e))?;
    let extract_error = |source: zip::result::ZipError| DatasetError::ArchiveExtract {
        path: archive.to_path_buf(),
        source,
    };
    let mut zip = zip::ZipArchive::new(BufReader::new(file)).map_err(extract_error)?;
    debug!("extracting {} entries from {}", zip.len(), archive.display());
    zip.extract(dest).map_err(extract_error)
}

/// Deletes the `.zip` files sitting directly in `dir`. Returns how many were removed.
pub fn remove_archives(dir: &Path) -> DatasetResult<usize> {
    let mut removed = 0;
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            DatasetError::io(path, e.into())
        })?;
        let is_zip = entry
            .path()
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"));
        if entry.file_type().is_file() && is_zip {
            fs::remove_file(entry.path()).map_err(|e| DatasetError::io(entry.path(), e))?;
            removed += 1;
        }
    }
    Ok(removed)
}
