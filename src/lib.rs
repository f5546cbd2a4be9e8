//! # imgfit
//!
//! Resize raster images to a fixed geometry, optionally stamp a watermark on
//! them, and encode them under a hard file-size ceiling, one file at a time or
//! every image inside a `.zip` / `.7z` archive at once.
//!
//! # Architecture: One Pipeline, Two Drivers
//!
//! Every image goes through the same three steps:
//!
//! ```text
//! 1. Normalize   bytes   →  RGBA buffer, exactly width x height (Lanczos3)
//! 2. Watermark   buffer  →  buffer with the logo centered at 60% coverage
//! 3. Encode      buffer  →  bytes ≤ ceiling (quality 95 → 10 in steps of 5)
//! ```
//!
//! Single mode drives the pipeline once and writes `processed_<stem>.<ext>`.
//! Batch mode drives it once per archive entry and packs the results into one
//! zip, skipping entries that fail instead of aborting.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Backend trait, decode/resize/encode, watermark, quality ladder |
//! | [`pipeline`] | Per-image pipeline and single-file driver |
//! | [`archive`] | Zip / 7z extraction into one entry stream, output zip writer |
//! | [`batch`] | Batch state machine, progress events, JSON report |
//! | [`config`] | Layered `imgfit.toml` loading, validation, merging |
//! | [`naming`] | Image extension filter and output naming rules |
//! | [`types`] | Per-entry batch outcomes shared with the report |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Backend Behind a Trait
//!
//! Decode, resize and encode sit behind [`imaging::ImageBackend`]. The
//! orchestration above it (the quality ladder, watermark placement, batch
//! bookkeeping) is tested against a recording mock that never touches pixels.
//!
//! ## Best-Effort Watermark
//!
//! A watermark that cannot be decoded or scaled leaves the image untouched
//! rather than failing it; the failure is logged at debug level.
//!
//! ## Linear Quality Search
//!
//! Encoded size is not strictly monotonic in quality for every encoder, so
//! the encoder walks the ladder top-down and keeps the first attempt that
//! fits, at most eighteen attempts per image.

pub mod archive;
pub mod batch;
pub mod config;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
