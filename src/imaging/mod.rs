//! Image processing: decode, normalize, watermark, and size-constrained encode.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::load_from_memory` (PNG, JPEG, WebP by content) |
//! | **Normalize** | `resize_exact` with Lanczos3, always RGBA |
//! | **Watermark** | Lanczos3 scale + `imageops::overlay` |
//! | **Encode** | `image` JPEG/PNG encoders, `webp` (libwebp) for lossy WebP |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for watermark geometry and the quality ladder
//! - **Parameters**: Data structures describing what to produce
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend
//! - **Watermark**: Best-effort logo compositing on top of the backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;
pub mod watermark;

pub use backend::{BackendError, ColorModel, Dimensions, ImageBackend, PixelBuffer};
pub use calculations::{calculate_logo_dimensions, centered_offset, next_quality};
pub use operations::{EncodedImage, encode_within_limit, normalize};
pub use params::{
    Logo, Opacity, OutputFormat, QUALITY_FLOOR, QUALITY_START, QUALITY_STEP, Quality,
    SizeConstraint, UnknownFormat,
};
pub use rust_backend::RustBackend;
pub use watermark::apply_logo;
