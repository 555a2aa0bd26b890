//! Conversion between fixed-size RGB images and model tensors.
//!
//! Encoding reads pixels in row-major order and writes `R, G, B` for each
//! pixel, divided by 255, into an NHWC tensor of shape `(1, height, width, 3)`.
//! The flat offset of channel `c` at pixel `(x, y)` is `(y * width + x) * 3 + c`.
//!
//! Decoding reads three consecutive values per pixel, clamps each to `[0, 1]`,
//! scales by 255 and truncates. Both the clamp-before-scale order and the
//! truncation are part of the output contract.

use std::borrow::Cow;

use image::{DynamicImage, GenericImageView, RgbaImage};
use ndarray::{ArrayBase, Data, Dimension};

use crate::error::{Error, Result};
use crate::image::{tensor_len, ImageTensor, MODEL_HEIGHT, MODEL_WIDTH, RGB_CHANNELS};

/// Encode an image of exactly `width` x `height` into a normalized tensor.
///
/// Alpha is ignored. Resizing is the caller's job, see
/// [`fit_to_model`](crate::image::fit_to_model).
///
/// # Errors
///
/// Returns [`Error::ShapeMismatch`] if the image has other dimensions.
pub fn encode(img: &DynamicImage, width: u32, height: u32) -> Result<ImageTensor> {
    let (img_w, img_h) = img.dimensions();
    if (img_w, img_h) != (width, height) {
        return Err(Error::shape(
            format!("{width}x{height} image"),
            format!("{img_w}x{img_h} image"),
        ));
    }

    let mut data = Vec::with_capacity(tensor_len(width, height));
    for y in 0..height {
        for x in 0..width {
            let pixel = img.get_pixel(x, y);
            data.push(f32::from(pixel[0]) / 255.0);
            data.push(f32::from(pixel[1]) / 255.0);
            data.push(f32::from(pixel[2]) / 255.0);
        }
    }

    let shape = (1, height as usize, width as usize, RGB_CHANNELS);
    ImageTensor::from_shape_vec(shape, data)
        .map_err(|e| Error::shape(format!("{shape:?} tensor"), e.to_string()))
}

/// [`encode`] with the model's native input size.
///
/// # Errors
///
/// Returns [`Error::ShapeMismatch`] unless the image is 178x218.
pub fn encode_default(img: &DynamicImage) -> Result<ImageTensor> {
    encode(img, MODEL_WIDTH, MODEL_HEIGHT)
}

/// Decode a tensor of `width * height * 3` values into an opaque RGBA image.
///
/// Only the element count is checked; values are read in logical (row-major)
/// order whatever the tensor's rank or memory layout.
///
/// # Errors
///
/// Returns [`Error::ShapeMismatch`] if the element count is wrong.
pub fn decode<S, D>(tensor: &ArrayBase<S, D>, width: u32, height: u32) -> Result<RgbaImage>
where
    S: Data<Elem = f32>,
    D: Dimension,
{
    let expected = tensor_len(width, height);
    if tensor.len() != expected {
        return Err(Error::shape(
            format!("{expected} values ({width}x{height}x{RGB_CHANNELS})"),
            format!("{} values {:?}", tensor.len(), tensor.shape()),
        ));
    }

    let values: Cow<'_, [f32]> = match tensor.as_slice() {
        Some(slice) => Cow::Borrowed(slice),
        None => Cow::Owned(tensor.iter().copied().collect()),
    };

    let mut raw = Vec::with_capacity(width as usize * height as usize * 4);
    for rgb in values.chunks_exact(RGB_CHANNELS) {
        raw.extend_from_slice(&[
            to_channel(rgb[0]),
            to_channel(rgb[1]),
            to_channel(rgb[2]),
            255,
        ]);
    }

    RgbaImage::from_raw(width, height, raw)
        .ok_or_else(|| Error::shape(format!("{width}x{height} image"), "short pixel buffer"))
}

/// [`decode`] with the model's native output size.
///
/// # Errors
///
/// Returns [`Error::ShapeMismatch`] unless the tensor holds 178x218x3 values.
pub fn decode_default<S, D>(tensor: &ArrayBase<S, D>) -> Result<RgbaImage>
where
    S: Data<Elem = f32>,
    D: Dimension,
{
    decode(tensor, MODEL_WIDTH, MODEL_HEIGHT)
}

/// Clamp to [0, 1], scale to [0, 255] and truncate. NaN maps to 0.
#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_channel(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0) as u8
}

/// Summary of a tensor's values, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TensorStats {
    pub len: usize,
    pub min: f32,
    pub max: f32,
    pub mean: f32,
    /// Values outside `[0, 1]`, NaN included.
    pub out_of_range: usize,
}

/// Compute [`TensorStats`] over every element.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn tensor_stats<S, D>(tensor: &ArrayBase<S, D>) -> TensorStats
where
    S: Data<Elem = f32>,
    D: Dimension,
{
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    let mut sum = 0.0_f64;
    let mut out_of_range = 0;

    for &v in tensor {
        min = min.min(v);
        max = max.max(v);
        sum += f64::from(v);
        if !(0.0..=1.0).contains(&v) {
            out_of_range += 1;
        }
    }

    let len = tensor.len();
    let mean = if len == 0 { 0.0 } else { (sum / len as f64) as f32 };

    TensorStats {
        len,
        min,
        max,
        mean,
        out_of_range,
    }
}

/// Log a tensor summary at debug level, and every value at trace level.
pub fn log_tensor<S, D>(label: &str, tensor: &ArrayBase<S, D>)
where
    S: Data<Elem = f32>,
    D: Dimension,
{
    if tracing::enabled!(tracing::Level::DEBUG) {
        let stats = tensor_stats(tensor);
        tracing::debug!(
            "{label} tensor: {} values, min {:.4}, max {:.4}, mean {:.4}, {} outside [0, 1]",
            stats.len,
            stats.min,
            stats.max,
            stats.mean,
            stats.out_of_range
        );
    }

    if tracing::enabled!(tracing::Level::TRACE) {
        for (i, v) in tensor.iter().enumerate() {
            tracing::trace!("{label} tensor value {i}: {v}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba};
    use ndarray::{Array1, Array4};

    fn solid(r: u8, g: u8, b: u8) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(MODEL_WIDTH, MODEL_HEIGHT, Rgb([r, g, b])))
    }

    #[test]
    fn test_encode_shape_and_length() {
        let tensor = encode_default(&solid(1, 2, 3)).unwrap();

        assert_eq!(tensor.shape(), &[1, 218, 178, 3]);
        assert_eq!(tensor.len(), 178 * 218 * 3);
    }

    #[test]
    fn test_black_image_encodes_to_zeros_and_back() {
        let tensor = encode_default(&solid(0, 0, 0)).unwrap();
        assert!(tensor.iter().all(|&v| v == 0.0));

        let img = decode_default(&tensor).unwrap();
        assert!(img.pixels().all(|p| p.0 == [0, 0, 0, 255]));
    }

    #[test]
    fn test_white_image_encodes_to_ones_and_back() {
        let tensor = encode_default(&solid(255, 255, 255)).unwrap();
        assert!(tensor.iter().all(|&v| v == 1.0));

        let img = decode_default(&tensor).unwrap();
        assert!(img.pixels().all(|p| p.0 == [255, 255, 255, 255]));
    }

    #[test]
    fn test_encode_channel_order_and_offsets() {
        let mut rgb = RgbImage::new(MODEL_WIDTH, MODEL_HEIGHT);
        rgb.put_pixel(5, 7, Rgb([255, 51, 0]));
        let tensor = encode_default(&DynamicImage::ImageRgb8(rgb)).unwrap();

        let flat = tensor.as_slice().unwrap();
        let p = (7 * MODEL_WIDTH as usize + 5) * 3;
        assert_eq!(flat[p], 1.0);
        assert_eq!(flat[p + 1], 0.2);
        assert_eq!(flat[p + 2], 0.0);
        assert_eq!(tensor[[0, 7, 5, 1]], 0.2);
    }

    #[test]
    fn test_encode_ignores_alpha() {
        let rgba = RgbaImage::from_pixel(MODEL_WIDTH, MODEL_HEIGHT, Rgba([255, 0, 0, 0]));
        let tensor = encode_default(&DynamicImage::ImageRgba8(rgba)).unwrap();

        assert_eq!(tensor[[0, 0, 0, 0]], 1.0);
        assert_eq!(tensor[[0, 0, 0, 1]], 0.0);
    }

    #[test]
    fn test_encode_wrong_dimensions() {
        let img = DynamicImage::new_rgb8(MODEL_HEIGHT, MODEL_WIDTH);
        let err = encode_default(&img).unwrap_err();

        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }

    #[test]
    fn test_decode_wrong_length() {
        let tensor = Array1::<f32>::zeros(178 * 218 * 3 - 1);
        let err = decode_default(&tensor).unwrap_err();

        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }

    #[test]
    fn test_decode_clamps_and_truncates() {
        assert_eq!(to_channel(-10.0), 0);
        assert_eq!(to_channel(0.0), 0);
        assert_eq!(to_channel(0.5), 127);
        assert_eq!(to_channel(0.999), 254);
        assert_eq!(to_channel(1.0), 255);
        assert_eq!(to_channel(10.0), 255);
        assert_eq!(to_channel(f32::NAN), 0);
    }

    #[test]
    fn test_decode_places_pixels_row_major() {
        let mut data = vec![0.0_f32; 6 * 3];
        // pixel 4 of a 3x2 image is (x = 1, y = 1)
        data[4 * 3] = 1.0;
        data[4 * 3 + 2] = 0.5;
        let tensor = Array1::from_vec(data);

        let img = decode(&tensor, 3, 2).unwrap();

        assert_eq!(img.get_pixel(1, 1).0, [255, 0, 127, 255]);
        assert_eq!(img.get_pixel(0, 1).0, [0, 0, 0, 255]);
    }

    #[test]
    fn test_decode_out_of_range_values_stay_in_bounds() {
        let tensor = Array4::from_shape_fn((1, 218, 178, 3), |(_, y, x, c)| {
            ((y * 31 + x * 7 + c) % 41) as f32 / 2.0 - 10.0
        });
        let img = decode_default(&tensor).unwrap();

        for (p, px) in img.pixels().enumerate() {
            for c in 0..3 {
                let v = tensor.as_slice().unwrap()[p * 3 + c];
                if v <= 0.0 {
                    assert_eq!(px[c], 0);
                } else if v >= 1.0 {
                    assert_eq!(px[c], 255);
                }
            }
            assert_eq!(px[3], 255);
        }
    }

    #[test]
    fn test_decode_non_standard_layout() {
        let mut tensor = Array4::<f32>::zeros((1, 178, 218, 3));
        tensor[[0, 0, 1, 0]] = 1.0;
        let swapped = tensor.view().permuted_axes([0, 2, 1, 3]);

        let img = decode_default(&swapped).unwrap();

        assert_eq!(img.get_pixel(0, 1).0, [255, 0, 0, 255]);
        assert_eq!(img.get_pixel(1, 0).0, [0, 0, 0, 255]);
    }

    #[test]
    fn test_quantization_round_trip_within_one_level() {
        for v in 0..=255_u8 {
            let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(
                MODEL_WIDTH,
                MODEL_HEIGHT,
                Rgb([v, 255 - v, v / 2]),
            ));
            let back = decode_default(&encode_default(&img).unwrap()).unwrap();
            let px = back.get_pixel(100, 100);

            assert!(v.abs_diff(px[0]) <= 1, "red {v} -> {}", px[0]);
            assert!((255 - v).abs_diff(px[1]) <= 1);
            assert!((v / 2).abs_diff(px[2]) <= 1);
        }
    }

    #[test]
    fn test_tensor_stats() {
        let tensor = Array1::from_vec(vec![-1.0, 0.0, 0.5, 1.0, 2.5]);
        let stats = tensor_stats(&tensor);

        assert_eq!(stats.len, 5);
        assert_eq!(stats.min, -1.0);
        assert_eq!(stats.max, 2.5);
        assert!((stats.mean - 0.6).abs() < 1e-6);
        assert_eq!(stats.out_of_range, 2);
    }
}
