//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, WebP) | `image::load_from_memory` |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` (quality aware) |
//! | Encode → PNG | `image::codecs::png::PngEncoder` (lossless, quality ignored) |
//! | Encode → WebP | `webp::Encoder` (libwebp, lossy, quality aware) |

use super::backend::{BackendError, ImageBackend, PixelBuffer};
use super::params::{OutputFormat, Quality};
use image::DynamicImage;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::FilterType;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn encode_jpeg(image: &DynamicImage, quality: Quality) -> Result<Vec<u8>, BackendError> {
    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, quality.value());
    // The JPEG encoder rejects alpha; callers normally flatten first.
    let result = if image.color().has_alpha() {
        DynamicImage::ImageRgb8(image.to_rgb8()).write_with_encoder(encoder)
    } else {
        image.write_with_encoder(encoder)
    };
    result.map_err(|e| BackendError::Encode {
        format: OutputFormat::Jpeg,
        reason: e.to_string(),
    })?;
    Ok(out)
}

fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, BackendError> {
    let mut out = Vec::new();
    image
        .write_with_encoder(PngEncoder::new(&mut out))
        .map_err(|e| BackendError::Encode {
            format: OutputFormat::Png,
            reason: e.to_string(),
        })?;
    Ok(out)
}

fn encode_webp(image: &DynamicImage, quality: Quality) -> Result<Vec<u8>, BackendError> {
    let fail = |reason: String| BackendError::Encode {
        format: OutputFormat::Webp,
        reason,
    };

    // libwebp only takes 8-bit RGB or RGBA.
    let converted;
    let image = match image {
        DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_) => image,
        other if other.color().has_alpha() => {
            converted = DynamicImage::ImageRgba8(other.to_rgba8());
            &converted
        }
        other => {
            converted = DynamicImage::ImageRgb8(other.to_rgb8());
            &converted
        }
    };

    let encoder = webp::Encoder::from_image(image).map_err(|e| fail(e.to_string()))?;
    let encoded = encoder
        .encode_simple(false, f32::from(quality.value()))
        .map_err(|e| fail(format!("{e:?}")))?;
    Ok(encoded.to_vec())
}

impl ImageBackend for RustBackend {
    fn decode(&self, bytes: &[u8]) -> Result<PixelBuffer, BackendError> {
        image::load_from_memory(bytes)
            .map(PixelBuffer::new)
            .map_err(|e| BackendError::Decode(e.to_string()))
    }

    fn resize(
        &self,
        buffer: PixelBuffer,
        width: u32,
        height: u32,
    ) -> Result<PixelBuffer, BackendError> {
        if width == 0 || height == 0 {
            return Err(BackendError::InvalidDimensions { width, height });
        }
        if buffer.width() == width && buffer.height() == height {
            return Ok(buffer);
        }
        let resized = buffer
            .into_image()
            .resize_exact(width, height, FilterType::Lanczos3);
        Ok(PixelBuffer::new(resized))
    }

    fn encode(
        &self,
        buffer: &PixelBuffer,
        format: OutputFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, BackendError> {
        match format {
            OutputFormat::Jpeg => encode_jpeg(buffer.as_image(), quality),
            OutputFormat::Png => encode_png(buffer.as_image()),
            OutputFormat::Webp => encode_webp(buffer.as_image(), quality),
        }
    }
}
