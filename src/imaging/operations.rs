//! High-level image operations.
//!
//! These functions combine calculations with backend execution: they decide
//! *what* to ask of the backend and in which order, but never touch pixels
//! themselves.

use super::backend::{BackendError, ImageBackend, PixelBuffer};
use super::calculations::next_quality;
use super::params::{OutputFormat, Quality, SizeConstraint};
use tracing::{debug, warn};

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Output of the size-constrained encoder.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub format: OutputFormat,
    /// Quality of the attempt that produced `bytes`.
    pub quality: Quality,
    pub attempts: u32,
    /// `false` when even the floor quality overshot the ceiling.
    pub within_limit: bool,
}

impl EncodedImage {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Decode raw bytes and resize them to exactly `width` x `height`.
///
/// The result always carries an alpha channel so a watermark can be blended
/// onto it regardless of the source format.
pub fn normalize(
    backend: &impl ImageBackend,
    bytes: &[u8],
    width: u32,
    height: u32,
) -> Result<PixelBuffer> {
    let decoded = backend.decode(bytes)?.with_alpha();
    backend.resize(decoded, width, height)
}

/// Encode a buffer, walking the quality ladder down until it fits.
///
/// Starts at [`Quality::default`] and steps down through
/// [`next_quality`] until the output is within `constraint.max_bytes` or the
/// floor is reached. The last attempt is returned even when it overshoots.
/// Lossless formats produce the same bytes at every quality, so they stop
/// after the first attempt.
pub fn encode_within_limit(
    backend: &impl ImageBackend,
    buffer: PixelBuffer,
    constraint: &SizeConstraint,
) -> Result<EncodedImage> {
    let format = constraint.format;
    let buffer = if format.supports_alpha() {
        buffer
    } else {
        buffer.flatten()
    };

    let mut quality = Quality::default();
    let mut attempts = 0;
    loop {
        let bytes = backend.encode(&buffer, format, quality)?;
        attempts += 1;
        let size = bytes.len() as u64;
        let within_limit = size <= constraint.max_bytes;
        debug!(
            format = %format,
            quality = quality.value(),
            size,
            limit = constraint.max_bytes,
            "encode attempt"
        );

        let next = if within_limit || !format.is_lossy() {
            None
        } else {
            next_quality(quality)
        };

        match next {
            Some(lower) => quality = lower,
            None => {
                if !within_limit {
                    warn!(
                        format = %format,
                        quality = quality.value(),
                        size,
                        limit = constraint.max_bytes,
                        "could not reach size limit, keeping last attempt"
                    );
                }
                return Ok(EncodedImage {
                    bytes,
                    format,
                    quality,
                    attempts,
                    within_limit,
                });
            }
        }
    }
}
