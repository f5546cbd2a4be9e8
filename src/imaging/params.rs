//! Parameter types for image operations.
//!
//! These types describe *what* to produce, not *how*. They sit between the
//! high-level [`operations`](super::operations) (which decide what to encode)
//! and the [`backend`](super::backend) (which does the pixel work).
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100). Clamped on construction.
//! - [`OutputFormat`]: Closed set of encodable formats, parsed case-insensitively.
//! - [`Opacity`]: Watermark opacity percentage (0–100). Clamped on construction.
//! - [`SizeConstraint`]: Target format plus the byte ceiling the encoder aims for.
//! - [`Logo`]: Raw watermark bytes plus the opacity to blend them at.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// First rung of the quality ladder.
pub const QUALITY_START: u8 = 95;
/// Last rung of the quality ladder; the encoder never goes below it.
pub const QUALITY_FLOOR: u8 = 10;
/// Distance between two rungs of the quality ladder.
pub const QUALITY_STEP: u8 = 5;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Quality(u8);

impl Quality {
    pub fn new(value: u8) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(QUALITY_START)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported output format '{0}' (expected webp, png, jpg or jpeg)")]
pub struct UnknownFormat(pub String);

/// Output formats the encoder can produce.
///
/// `jpg` is accepted as an alias and normalized to [`OutputFormat::Jpeg`];
/// [`OutputFormat::parse`] is the only place format names are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum OutputFormat {
    Webp,
    Png,
    Jpeg,
}

impl OutputFormat {
    /// Parse a user-supplied format name (case-insensitive, `jpg` → `jpeg`).
    pub fn parse(name: &str) -> Result<Self, UnknownFormat> {
        match name.trim().to_ascii_lowercase().as_str() {
            "webp" => Ok(Self::Webp),
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            _ => Err(UnknownFormat(name.to_string())),
        }
    }

    /// Canonical lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Webp => "webp",
            Self::Png => "png",
            Self::Jpeg => "jpeg",
        }
    }

    /// File extension used for output names.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Webp => "webp",
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Webp => "image/webp",
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }

    /// Whether the format can carry an alpha channel.
    pub fn supports_alpha(self) -> bool {
        !matches!(self, Self::Jpeg)
    }

    /// Whether the encoder output depends on [`Quality`].
    pub fn is_lossy(self) -> bool {
        !matches!(self, Self::Png)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OutputFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for OutputFormat {
    type Error = UnknownFormat;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<OutputFormat> for String {
    fn from(format: OutputFormat) -> Self {
        format.name().to_string()
    }
}

/// Watermark opacity as a percentage (0 = invisible, 100 = the logo's own alpha).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opacity(u8);

impl Opacity {
    pub fn new(percent: u8) -> Self {
        Self(percent.min(100))
    }

    pub fn percent(self) -> u8 {
        self.0
    }

    /// Multiplier applied to the watermark's alpha channel, in `[0, 1]`.
    pub fn fraction(self) -> f32 {
        (f32::from(self.0) / 100.0).clamp(0.0, 1.0)
    }
}

impl Default for Opacity {
    fn default() -> Self {
        Self(50)
    }
}

/// Target format and byte ceiling for the size-constrained encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeConstraint {
    pub format: OutputFormat,
    pub max_bytes: u64,
}

impl SizeConstraint {
    /// Build a constraint from a ceiling in kilobytes (1 KB = 1024 bytes).
    pub fn from_kilobytes(format: OutputFormat, max_kb: u64) -> Self {
        Self {
            format,
            max_bytes: max_kb.saturating_mul(1024),
        }
    }
}

/// A watermark to blend onto every processed image.
#[derive(Clone, PartialEq, Eq)]
pub struct Logo {
    pub bytes: Vec<u8>,
    pub opacity: Opacity,
}

impl fmt::Debug for Logo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logo")
            .field("bytes", &format_args!("<{} bytes>", self.bytes.len()))
            .field("opacity", &self.opacity)
            .finish()
    }
}
