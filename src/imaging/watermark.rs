//! Best-effort watermark compositing.
//!
//! A watermark never fails the image it is applied to: anything that goes
//! wrong while preparing it is logged at debug level and the base buffer is
//! returned untouched.

use super::backend::{BackendError, ImageBackend, PixelBuffer};
use super::calculations::{blend_over, calculate_logo_dimensions, centered_offset, scale_alpha};
use super::params::{Logo, Opacity};
use image::RgbaImage;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum WatermarkError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("watermark {logo_width}x{logo_height} cannot be scaled onto {base_width}x{base_height}")]
    Degenerate {
        logo_width: u32,
        logo_height: u32,
        base_width: u32,
        base_height: u32,
    },
}

/// Blend `logo` onto the center of `base`, or return `base` unchanged.
pub fn apply_logo(
    backend: &impl ImageBackend,
    base: PixelBuffer,
    logo: Option<&Logo>,
) -> PixelBuffer {
    let Some(logo) = logo else {
        return base;
    };

    let prepared = match prepare_logo(backend, &base, logo) {
        Ok(prepared) => prepared,
        Err(e) => {
            debug!(error = %e, "watermark skipped");
            return base;
        }
    };

    let (x, y) = centered_offset(base.dimensions(), prepared.dimensions());
    let mut canvas = base.into_rgba();
    composite(&mut canvas, &prepared.into_rgba(), x, y);
    PixelBuffer::from(canvas)
}

/// Blend `top` over `canvas` with its top-left corner at `(x, y)`, clipping
/// whatever falls outside the canvas.
fn composite(canvas: &mut RgbaImage, top: &RgbaImage, x: i64, y: i64) {
    let clip = |offset: i64, top_len: u32, canvas_len: u32| {
        let start = (-offset).clamp(0, i64::from(top_len));
        let end = (i64::from(canvas_len) - offset).clamp(start, i64::from(top_len));
        start..end
    };
    let columns = clip(x, top.width(), canvas.width());
    let rows = clip(y, top.height(), canvas.height());

    for ty in rows {
        for tx in columns.clone() {
            // Both coordinates are inside their images after clipping.
            let (cx, cy) = ((tx + x) as u32, (ty + y) as u32);
            let over = top.get_pixel(tx as u32, ty as u32).0;
            let pixel = canvas.get_pixel_mut(cx, cy);
            pixel.0 = blend_over(pixel.0, over);
        }
    }
}

/// Decode, scale, and fade the watermark for a given base buffer.
fn prepare_logo(
    backend: &impl ImageBackend,
    base: &PixelBuffer,
    logo: &Logo,
) -> Result<PixelBuffer, WatermarkError> {
    let decoded = backend.decode(&logo.bytes)?.with_alpha();
    let (width, height) = calculate_logo_dimensions(base.dimensions(), decoded.dimensions())
        .ok_or(WatermarkError::Degenerate {
            logo_width: decoded.width(),
            logo_height: decoded.height(),
            base_width: base.width(),
            base_height: base.height(),
        })?;

    let resized = backend.resize(decoded, width, height)?;
    Ok(PixelBuffer::from(fade(resized.into_rgba(), logo.opacity)))
}

fn fade(mut image: RgbaImage, opacity: Opacity) -> RgbaImage {
    let fraction = opacity.fraction();
    for pixel in image.pixels_mut() {
        pixel.0[3] = scale_alpha(pixel.0[3], fraction);
    }
    image
}
