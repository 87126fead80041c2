use crate::error::{DatasetError, DatasetResult};
use image::RgbImage;
use std::path::Path;

/// Decodes an image file and coerces it to 8-bit RGB.
///
/// Grayscale, paletted and alpha images are all converted, so callers can always assume three
/// channels. Missing files and corrupt data both surface as [`DatasetError::ImageLoad`].
pub fn read_image_as_rgb8(filepath: &Path) -> DatasetResult<RgbImage> {
    let img = image::open(filepath).map_err(|source| DatasetError::ImageLoad {
        path: filepath.to_path_buf(),
        source,
    })?;
    Ok(img.into_rgb8())
}
