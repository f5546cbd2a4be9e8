//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three primitives the pipeline is
//! built from: decode, resize, and encode. Everything above it (normalizing,
//! watermarking, the quality ladder) is backend-agnostic and is unit tested
//! against a recording mock.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend).

use super::params::{OutputFormat, Quality};
use image::{DynamicImage, RgbaImage};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Invalid target dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("Failed to encode {format}: {reason}")]
    Encode {
        format: OutputFormat,
        reason: String,
    },
}

/// Width and height of a pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Channel layout of a [`PixelBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorModel {
    /// 8-bit RGB, fully opaque.
    Rgb,
    /// 8-bit RGB with an alpha channel.
    Rgba,
}

/// A decoded, addressable image owned by exactly one pipeline stage at a time.
///
/// Stages take the buffer by value and hand back a new one, so a buffer is
/// never shared between operations.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    image: DynamicImage,
}

impl PixelBuffer {
    pub fn new(image: DynamicImage) -> Self {
        Self { image }
    }

    /// A fully transparent RGBA buffer.
    #[cfg(test)]
    pub(crate) fn blank(width: u32, height: u32) -> Self {
        Self::from(RgbaImage::new(width, height))
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width(),
            height: self.height(),
        }
    }

    pub fn color_model(&self) -> ColorModel {
        if self.image.color().has_alpha() {
            ColorModel::Rgba
        } else {
            ColorModel::Rgb
        }
    }

    /// Convert to 8-bit RGBA, adding an opaque alpha channel if there is none.
    pub fn with_alpha(self) -> Self {
        match self.image {
            DynamicImage::ImageRgba8(_) => self,
            other => Self::from(other.into_rgba8()),
        }
    }

    /// Convert to opaque 8-bit RGB by discarding the alpha channel.
    pub fn flatten(self) -> Self {
        match self.image {
            DynamicImage::ImageRgb8(_) => self,
            other => Self::new(DynamicImage::ImageRgb8(other.into_rgb8())),
        }
    }

    pub fn as_image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn into_image(self) -> DynamicImage {
        self.image
    }

    pub fn into_rgba(self) -> RgbaImage {
        self.image.into_rgba8()
    }
}

impl From<RgbaImage> for PixelBuffer {
    fn from(image: RgbaImage) -> Self {
        Self::new(DynamicImage::ImageRgba8(image))
    }
}

/// Trait for image processing backends.
///
/// Implementations must be deterministic: the same input and parameters
/// produce the same output bytes. The size-constrained encoder relies on this
/// when it compares attempts.
pub trait ImageBackend {
    /// Decode raw bytes in any supported input format.
    fn decode(&self, bytes: &[u8]) -> Result<PixelBuffer, BackendError>;

    /// Resize to exactly `width` x `height`, ignoring the source aspect ratio.
    fn resize(
        &self,
        buffer: PixelBuffer,
        width: u32,
        height: u32,
    ) -> Result<PixelBuffer, BackendError>;

    /// Serialize a buffer in `format` at `quality`.
    fn encode(
        &self,
        buffer: &PixelBuffer,
        format: OutputFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, BackendError>;
}
