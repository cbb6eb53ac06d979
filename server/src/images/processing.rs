use std::io::Cursor;

use image::{DynamicImage, ImageFormat, ImageReader};
use thiserror::Error;

use super::ImagePreset;

/// Allowed image formats for recipe images.
pub const ALLOWED_FORMATS: &[ImageFormat] = &[
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::Gif,
    ImageFormat::WebP,
];

/// Maximum upload size for a recipe image (10MB).
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("File too large. Maximum size is {} bytes", MAX_FILE_SIZE)]
    TooLarge,

    #[error("Could not detect image format")]
    UnknownFormat,

    #[error("Unsupported image format: {0:?}. Allowed: JPEG, PNG, GIF, WebP")]
    UnsupportedFormat(ImageFormat),

    #[error("Failed to read image: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to process image: {0}")]
    Codec(#[from] image::ImageError),
}

/// An uploaded image with its rendered presets.
#[derive(Debug)]
pub struct ProcessedImage {
    pub content_type: String,
    pub small: Vec<u8>,
    pub medium: Vec<u8>,
}

/// Detect format from magic bytes, validate it's allowed, and render every preset.
pub fn process_image(data: &[u8]) -> Result<ProcessedImage, ImageError> {
    if data.len() > MAX_FILE_SIZE {
        return Err(ImageError::TooLarge);
    }

    let reader = ImageReader::new(Cursor::new(data)).with_guessed_format()?;

    let format = reader.format().ok_or(ImageError::UnknownFormat)?;

    if !ALLOWED_FORMATS.contains(&format) {
        return Err(ImageError::UnsupportedFormat(format));
    }

    let content_type = format.to_mime_type().to_string();
    let img = reader.decode()?;

    Ok(ProcessedImage {
        content_type,
        small: render_preset(&img, ImagePreset::Small)?,
        medium: render_preset(&img, ImagePreset::Medium)?,
    })
}

/// Fit the image within the preset's bounding box and encode it as JPEG.
fn render_preset(img: &DynamicImage, preset: ImagePreset) -> Result<Vec<u8>, ImageError> {
    let size = preset.max_edge();
    // thumbnail() preserves aspect ratio; never upscale small originals
    let resized = if img.width() > size || img.height() > size {
        img.thumbnail(size, size)
    } else {
        img.clone()
    };

    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(resized.to_rgb8()).write_to(&mut buf, ImageFormat::Jpeg)?;
    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, RgbImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let pixels = RgbImage::from_pixel(width, height, image::Rgb([200, 120, 40]));
        let img = DynamicImage::ImageRgb8(pixels);
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    fn dimensions(jpeg: &[u8]) -> (u32, u32) {
        image::load_from_memory_with_format(jpeg, ImageFormat::Jpeg)
            .unwrap()
            .dimensions()
    }

    #[test]
    fn test_presets_fit_within_bounds() {
        let processed = process_image(&png_bytes(1600, 800)).unwrap();
        assert_eq!(processed.content_type, "image/png");
        assert_eq!(dimensions(&processed.small), (240, 120));
        assert_eq!(dimensions(&processed.medium), (720, 360));
    }

    #[test]
    fn test_small_originals_are_not_upscaled() {
        let processed = process_image(&png_bytes(100, 50)).unwrap();
        assert_eq!(dimensions(&processed.small), (100, 50));
        assert_eq!(dimensions(&processed.medium), (100, 50));
    }

    #[test]
    fn test_rejects_non_images() {
        assert!(matches!(
            process_image(b"definitely not an image"),
            Err(ImageError::UnknownFormat)
        ));
    }
}
