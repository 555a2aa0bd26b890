//! Image loading and resizing utilities.

use std::path::Path;

use image::{imageops::FilterType, DynamicImage, GenericImageView};

use crate::error::{Error, Result};

/// Load an image from disk in whatever pixel format it is stored in.
///
/// # Errors
///
/// Returns an error if the image cannot be opened or decoded.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<DynamicImage> {
    let path = path.as_ref();

    let img = image::open(path).map_err(|source| Error::ImageLoad {
        path: path.to_path_buf(),
        source,
    })?;

    let (width, height) = img.dimensions();
    tracing::debug!("Loaded {} ({width}x{height})", path.display());

    Ok(img)
}

/// Resample an image to exactly `width` x `height`.
///
/// Aspect ratio is not preserved. An image that already has the target size
/// is returned as is.
///
/// # Errors
///
/// Returns an error if either target dimension is zero.
pub fn fit_to_model(
    img: DynamicImage,
    width: u32,
    height: u32,
    filter: FilterType,
) -> Result<DynamicImage> {
    if width == 0 || height == 0 {
        return Err(Error::InvalidParameter {
            name: "dimensions".to_string(),
            reason: format!("cannot resize to {width}x{height}"),
        });
    }

    if img.dimensions() == (width, height) {
        return Ok(img);
    }

    let (src_w, src_h) = img.dimensions();
    tracing::debug!("Resizing {src_w}x{src_h} -> {width}x{height}");
    Ok(img.resize_exact(width, height, filter))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{MODEL_HEIGHT, MODEL_WIDTH};

    #[test]
    fn test_fit_resizes_to_exact_dimensions() {
        let img = DynamicImage::new_rgb8(640, 480);
        let fitted = fit_to_model(img, MODEL_WIDTH, MODEL_HEIGHT, FilterType::Triangle).unwrap();

        assert_eq!(fitted.dimensions(), (MODEL_WIDTH, MODEL_HEIGHT));
    }

    #[test]
    fn test_fit_keeps_matching_image() {
        let mut img = DynamicImage::new_rgb8(MODEL_WIDTH, MODEL_HEIGHT);
        img.as_mut_rgb8().unwrap().put_pixel(3, 4, image::Rgb([9, 8, 7]));

        let fitted = fit_to_model(img, MODEL_WIDTH, MODEL_HEIGHT, FilterType::Triangle).unwrap();

        assert_eq!(fitted.to_rgb8().get_pixel(3, 4).0, [9, 8, 7]);
    }

    #[test]
    fn test_fit_rejects_zero_dimensions() {
        let img = DynamicImage::new_rgb8(10, 10);
        let err = fit_to_model(img, 0, 10, FilterType::Triangle).unwrap_err();

        assert!(matches!(err, Error::InvalidParameter { .. }));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_image("/definitely/not/here.png").unwrap_err();

        assert!(matches!(err, Error::ImageLoad { .. }));
    }

    #[test]
    fn test_load_roundtrip_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sketch.png");
        image::RgbImage::from_pixel(12, 7, image::Rgb([1, 2, 3]))
            .save(&path)
            .unwrap();

        let img = load_image(&path).unwrap();

        assert_eq!(img.dimensions(), (12, 7));
        assert_eq!(img.to_rgb8().get_pixel(0, 0).0, [1, 2, 3]);
    }
}
