//! Pure calculation functions for watermark geometry and the quality ladder.
//!
//! All functions here are pure and testable without any I/O or images.

use super::backend::Dimensions;
use super::params::{QUALITY_FLOOR, QUALITY_STEP, Quality};

/// Share of the base image's pixel area a watermark is scaled to cover.
pub const LOGO_COVERAGE: f64 = 0.6;

/// Calculate the scaled watermark size for a base image.
///
/// The watermark covers [`LOGO_COVERAGE`] of the base area while keeping its
/// own aspect ratio: `width = sqrt(area × aspect)`, `height = width / aspect`,
/// both truncated to whole pixels.
///
/// Returns `None` when either input is degenerate (zero-sized) or the result
/// would collapse to zero pixels on an axis.
///
/// # Examples
/// ```
/// # use imgfit::imaging::calculate_logo_dimensions;
/// # use imgfit::imaging::Dimensions;
/// let base = Dimensions { width: 1000, height: 1000 };
/// let logo = Dimensions { width: 200, height: 100 };
/// // area 600_000, aspect 2.0 → width 1095, height 547
/// assert_eq!(calculate_logo_dimensions(base, logo), Some((1095, 547)));
/// ```
pub fn calculate_logo_dimensions(base: Dimensions, logo: Dimensions) -> Option<(u32, u32)> {
    if base.width == 0 || base.height == 0 || logo.width == 0 || logo.height == 0 {
        return None;
    }

    let target_area = f64::from(base.width) * f64::from(base.height) * LOGO_COVERAGE;
    let aspect = f64::from(logo.width) / f64::from(logo.height);

    let width = (target_area * aspect).sqrt().trunc();
    let height = (width / aspect).trunc();

    let representable = |v: f64| (1.0..=f64::from(u32::MAX)).contains(&v);
    if !representable(width) || !representable(height) {
        return None;
    }

    Some((width as u32, height as u32))
}

/// Offset that centers an overlay on a base image.
///
/// Uses floor division so an overlay larger than the base gets a negative
/// offset and is clipped evenly on both sides.
pub fn centered_offset(base: Dimensions, overlay: Dimensions) -> (i64, i64) {
    let x = (i64::from(base.width) - i64::from(overlay.width)).div_euclid(2);
    let y = (i64::from(base.height) - i64::from(overlay.height)).div_euclid(2);
    (x, y)
}

/// Next rung down the quality ladder, or `None` once the floor is reached.
///
/// The ladder is `95, 90, …, 10`: eighteen rungs.
pub fn next_quality(current: Quality) -> Option<Quality> {
    let value = current.value();
    if value <= QUALITY_FLOOR {
        return None;
    }
    Some(Quality::new(
        value.saturating_sub(QUALITY_STEP).max(QUALITY_FLOOR),
    ))
}

/// Composite one RGBA pixel over another (Porter-Duff source-over).
///
/// Output alpha is `a_t + a_b·(1 − a_t)`; colour channels are blended
/// premultiplied and divided back out. Results are rounded, so an opaque
/// `base` always stays opaque.
pub fn blend_over(base: [u8; 4], top: [u8; 4]) -> [u8; 4] {
    let alpha_top = f32::from(top[3]) / 255.0;
    let alpha_base = f32::from(base[3]) / 255.0;
    let alpha_out = alpha_top + alpha_base * (1.0 - alpha_top);
    if alpha_out <= 0.0 {
        return [0, 0, 0, 0];
    }

    let to_u8 = |v: f32| v.round().clamp(0.0, 255.0) as u8;
    let channel = |t: u8, b: u8| {
        let premultiplied =
            f32::from(t) * alpha_top + f32::from(b) * alpha_base * (1.0 - alpha_top);
        to_u8(premultiplied / alpha_out)
    };
    [
        channel(top[0], base[0]),
        channel(top[1], base[1]),
        channel(top[2], base[2]),
        to_u8(alpha_out * 255.0),
    ]
}

/// Scale an 8-bit alpha value by an opacity fraction in `[0, 1]`.
pub fn scale_alpha(alpha: u8, fraction: f32) -> u8 {
    (f32::from(alpha) * fraction.clamp(0.0, 1.0))
        .round()
        .clamp(0.0, 255.0) as u8
}
