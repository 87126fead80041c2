use image::{Rgb, RgbImage};
use ndarray::{Array3, ArrayView3, Axis};

/// Per-channel mean of ImageNet, the statistics the detection backbones are trained with.
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Converts an RGB image to a `(channel, row, column)` array with values in `[0, 1]`.
pub fn convert_rgb_image_to_owned_array(rgb_image: &RgbImage) -> Array3<f32> {
    let mut image_array = Array3::zeros((
        3,
        rgb_image.height() as usize,
        rgb_image.width() as usize,
    ));
    for (x, y, pixel) in rgb_image.enumerate_pixels() {
        let x = x as usize;
        let y = y as usize;
        let [r, g, b] = pixel.0;
        image_array[[0, y, x]] = (r as f32) / 255.;
        image_array[[1, y, x]] = (g as f32) / 255.;
        image_array[[2, y, x]] = (b as f32) / 255.;
    }
    image_array
}

/// Converts a `(channel, row, column)` array with values in `[0, 1]` back to an RGB image.
/// Out of range values are clipped.
pub fn convert_array_view_to_rgb_image(image_array: ArrayView3<f32>) -> RgbImage {
    let image_height = image_array.shape()[1] as u32;
    let image_width = image_array.shape()[2] as u32;

    let to_u8 = |v: f32| (v * 255.0).round().min(255.0).max(0.0) as u8;
    let mut rgb_image = RgbImage::new(image_width, image_height);
    for y in 0..image_height {
        for x in 0..image_width {
            let (row, col) = (y as usize, x as usize);
            let r = to_u8(image_array[[0, row, col]]);
            let g = to_u8(image_array[[1, row, col]]);
            let b = to_u8(image_array[[2, row, col]]);
            rgb_image.put_pixel(x, y, Rgb([r, g, b]));
        }
    }
    rgb_image
}

/// Standardizes each channel in place: `(v - mean[c]) / std[c]`.
pub fn normalize_channels(image_array: &mut Array3<f32>, mean: [f32; 3], std: [f32; 3]) {
    for (c, mut channel) in image_array.axis_iter_mut(Axis(0)).enumerate() {
        channel.mapv_inplace(|v| (v - mean[c]) / std[c]);
    }
}

/// Undoes [`normalize_channels`] with the ImageNet statistics and renders the result, for
/// eyeballing what a sample actually looks like after the transform.
pub fn to_preview_image(image_array: ArrayView3<f32>) -> RgbImage {
    let mut restored = image_array.to_owned();
    for (c, mut channel) in restored.axis_iter_mut(Axis(0)).enumerate() {
        channel.mapv_inplace(|v| (v * IMAGENET_STD[c] + IMAGENET_MEAN[c]).clamp(0.0, 1.0));
    }
    convert_array_view_to_rgb_image(restored.view())
}
