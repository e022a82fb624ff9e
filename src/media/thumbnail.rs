//! Fixed-size, center-cropped JPEG thumbnails.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use thiserror::Error;

pub const DEFAULT_THUMBNAIL_SIZE: u32 = 300;
pub const DEFAULT_THUMBNAIL_QUALITY: u8 = 85;

#[derive(Debug, Error)]
pub enum ThumbnailError {
    #[error("failed to decode source image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("failed to encode thumbnail: {0}")]
    Encode(#[source] image::ImageError),

    #[error("thumbnail generation unavailable: {0}")]
    Unavailable(String),
}

pub trait Thumbnailer: Send + Sync {
    /// Produce JPEG thumbnail bytes from source image bytes.
    fn thumbnail(&self, source: &[u8]) -> Result<Vec<u8>, ThumbnailError>;
}

/// Resizes to cover a square, cropping the overflow around the center.
#[derive(Debug, Clone)]
pub struct ImageThumbnailer {
    size: u32,
    quality: u8,
}

impl ImageThumbnailer {
    pub fn new(size: u32, quality: u8) -> Self {
        Self { size, quality }
    }
}

impl Default for ImageThumbnailer {
    fn default() -> Self {
        Self::new(DEFAULT_THUMBNAIL_SIZE, DEFAULT_THUMBNAIL_QUALITY)
    }
}

impl Thumbnailer for ImageThumbnailer {
    fn thumbnail(&self, source: &[u8]) -> Result<Vec<u8>, ThumbnailError> {
        let image = image::load_from_memory(source).map_err(ThumbnailError::Decode)?;
        let resized = image.resize_to_fill(self.size, self.size, FilterType::Lanczos3);

        // JPEG has no alpha channel
        let rgb = DynamicImage::ImageRgb8(resized.to_rgb8());
        let mut out = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut out, self.quality);
        rgb.write_with_encoder(encoder)
            .map_err(ThumbnailError::Encode)?;
        Ok(out)
    }
}
