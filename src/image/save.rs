//! Image saving utilities.

use std::path::Path;

use image::{DynamicImage, RgbaImage};

use crate::error::{Error, Result};

/// Save a generated image to disk.
///
/// The format is inferred from the extension. JPEG output drops the alpha
/// channel and uses `quality` (1-100); everything else is written through the
/// `image` crate's default encoder for that extension.
///
/// # Errors
///
/// Returns an error if the image cannot be encoded or written.
pub fn save_image<P: AsRef<Path>>(img: &RgbaImage, path: P, quality: u8) -> Result<()> {
    let path = path.as_ref();

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("png")
        .to_lowercase();

    match extension.as_str() {
        "jpg" | "jpeg" => {
            let mut output = std::fs::File::create(path)?;
            let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut output, quality);
            let rgb = DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(img.clone()).to_rgb8());
            rgb.write_with_encoder(encoder)
                .map_err(|source| Error::ImageSave {
                    path: path.to_path_buf(),
                    source,
                })?;
        }
        _ => {
            img.save(path).map_err(|source| Error::ImageSave {
                path: path.to_path_buf(),
                source,
            })?;
        }
    }

    tracing::debug!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_save_png_keeps_pixels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        let img = RgbaImage::from_pixel(4, 3, Rgba([10, 20, 30, 255]));

        save_image(&img, &path, 95).unwrap();

        let back = image::open(&path).unwrap().to_rgba8();
        assert_eq!(back.dimensions(), (4, 3));
        assert_eq!(back.get_pixel(2, 1).0, [10, 20, 30, 255]);
    }

    #[test]
    fn test_save_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jpg");
        let img = RgbaImage::from_pixel(8, 8, Rgba([200, 200, 200, 255]));

        save_image(&img, &path, 90).unwrap();

        assert_eq!(image::open(&path).unwrap().to_rgb8().dimensions(), (8, 8));
    }

    #[test]
    fn test_save_into_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("out.png");
        let img = RgbaImage::new(2, 2);

        assert!(save_image(&img, &path, 95).is_err());
    }
}
