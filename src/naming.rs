//! Centralized naming rules for inputs and outputs.
//!
//! All names here are archive-style: `/`-separated, independent of the host
//! platform's path separator.
//!
//! - `photo.PNG` is an image input; `notes.txt` is not.
//! - single mode: `holiday.jpeg` → `processed_holiday.webp`
//! - batch mode: `a/b/c.png` → `a/b/c.webp` (directory kept, extension swapped)

use crate::imaging::OutputFormat;

/// Extensions accepted as image inputs, lowercase.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

/// Whether `name` ends in one of [`IMAGE_EXTENSIONS`], ignoring case.
pub fn has_image_extension(name: &str) -> bool {
    let base = base_name(name);
    match base.rsplit_once('.') {
        Some((_, ext)) => IMAGE_EXTENSIONS
            .iter()
            .any(|known| ext.eq_ignore_ascii_case(known)),
        None => false,
    }
}

/// Everything after the last `/`.
fn base_name(name: &str) -> &str {
    name.rsplit_once('/').map_or(name, |(_, base)| base)
}

/// Base name with its final extension removed. `archive.tar.png` → `archive.tar`.
pub fn stem(name: &str) -> &str {
    let base = base_name(name);
    base.rsplit_once('.').map_or(base, |(stem, _)| stem)
}

/// Output file name for single-image mode.
pub fn single_output_name(input_name: &str, format: OutputFormat) -> String {
    format!("processed_{}.{}", stem(input_name), format.extension())
}

/// Output entry name for batch mode: keeps the directory, swaps the extension.
pub fn batch_entry_name(entry_name: &str, format: OutputFormat) -> String {
    let new_base = format!("{}.{}", stem(entry_name), format.extension());
    match entry_name.rsplit_once('/') {
        Some((dir, _)) => format!("{dir}/{new_base}"),
        None => new_base,
    }
}
