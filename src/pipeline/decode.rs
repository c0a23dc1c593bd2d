//! Image decoding: raw upload bytes → RGB8 pixel buffer.
//!
//! Vision APIs expect a plain 3-channel image. Uploads arrive as RGBA PNGs,
//! grayscale JPEGs, 16-bit PNGs and so on, so everything is converted to
//! RGB8 here. Oversized photos are downscaled to `max_dimension` on the
//! longer side.

use crate::error::LeafScanError;
use image::{imageops::FilterType, ColorType, DynamicImage, ImageFormat, ImageReader};
use std::io::Cursor;
use std::sync::Arc;
use tracing::debug;

/// A decoded upload. The inner image is always `DynamicImage::ImageRgb8`.
///
/// Clones share the pixel buffer.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    image: Arc<DynamicImage>,
    source_format: Option<ImageFormat>,
}

impl DecodedImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn color(&self) -> ColorType {
        self.image.color()
    }

    /// Format sniffed from the upload bytes.
    pub fn source_format(&self) -> Option<ImageFormat> {
        self.source_format
    }

    pub fn as_image(&self) -> &DynamicImage {
        &self.image
    }
}

/// Decode `bytes` as a JPEG or PNG and normalise to RGB8.
///
/// The format is sniffed from the content, not the filename, so a PNG
/// uploaded as `leaf.jpg` still decodes. Anything that fails to decode is a
/// client error.
pub fn decode_image(bytes: &[u8], max_dimension: u32) -> Result<DecodedImage, LeafScanError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| LeafScanError::InvalidImage {
            detail: e.to_string(),
        })?;
    let source_format = reader.format();

    let decoded = reader.decode().map_err(|e| LeafScanError::InvalidImage {
        detail: e.to_string(),
    })?;

    debug!(
        "Decoded {:?} image {}x{} ({:?})",
        source_format,
        decoded.width(),
        decoded.height(),
        decoded.color()
    );

    let decoded = fit_within(decoded, max_dimension);
    let image = match decoded {
        DynamicImage::ImageRgb8(_) => decoded,
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    };

    Ok(DecodedImage {
        image: Arc::new(image),
        source_format,
    })
}

fn fit_within(img: DynamicImage, max_dimension: u32) -> DynamicImage {
    if img.width() <= max_dimension && img.height() <= max_dimension {
        return img;
    }
    debug!(
        "Downscaling {}x{} to fit {}px",
        img.width(),
        img.height(),
        max_dimension
    );
    img.resize(max_dimension, max_dimension, FilterType::Triangle)
}
