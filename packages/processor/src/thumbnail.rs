//! Thumbnail rendering.
//!
//! Thumbnails fit within a square bounding box, keep the source aspect ratio
//! and are never upscaled. They are re-encoded in the source format when the
//! `image` crate can write it, otherwise as JPEG.

use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};

use crate::error::ProcessorError;

/// Default bounding box edge in pixels.
pub const DEFAULT_THUMBNAIL_SIZE: u32 = 300;

/// A rendered thumbnail plus the dimensions of its source image.
#[derive(Debug)]
pub struct Thumbnail {
    pub source_width: u32,
    pub source_height: u32,
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub content_type: &'static str,
}

/// Decode `data`, measure it and render a thumbnail within `max_dim × max_dim`.
///
/// CPU-bound; call from a blocking context.
pub fn render_thumbnail(data: &[u8], max_dim: u32) -> Result<Thumbnail, ProcessorError> {
    let format = image::guess_format(data)?;
    let source = image::load_from_memory_with_format(data, format)?;
    let (source_width, source_height) = source.dimensions();

    let resized = if source_width <= max_dim && source_height <= max_dim {
        source
    } else {
        source.resize(max_dim, max_dim, FilterType::Lanczos3)
    };
    let (width, height) = resized.dimensions();

    let (data, format) = match encode(&resized, format) {
        Ok(bytes) => (bytes, format),
        Err(e) => {
            tracing::debug!(?format, error = %e, "Source format not encodable, using JPEG");
            let bytes = encode(&resized, ImageFormat::Jpeg)
                .map_err(|e| ProcessorError::Encode(e.to_string()))?;
            (bytes, ImageFormat::Jpeg)
        }
    };

    Ok(Thumbnail {
        source_width,
        source_height,
        width,
        height,
        data,
        content_type: format.to_mime_type(),
    })
}

fn encode(img: &DynamicImage, format: ImageFormat) -> image::ImageResult<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    if format == ImageFormat::Jpeg {
        // JPEG has no alpha channel.
        DynamicImage::ImageRgb8(img.to_rgb8()).write_to(&mut buf, format)?;
    } else {
        img.write_to(&mut buf, format)?;
    }
    Ok(buf.into_inner())
}
