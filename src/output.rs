//! CLI output formatting for single and batch runs.
//!
//! # Output Format
//!
//! ## Single
//!
//! ```text
//! holiday.jpeg → out/processed_holiday.webp
//!     800x600 webp (image/webp), 48.2 KB at quality 85 (limit 100.0 KB)
//! ```
//!
//! ## Batch
//!
//! ```text
//! Found 3 images
//! [1/3]  33% cover.png → cover.webp (12.0 KB, q95)
//! [2/3]  67% trip/broken.png skipped: Failed to decode image: ...
//! [3/3] 100% trip/a.JPG → trip/a.webp (99.1 KB, q40, over limit)
//! Processed 2 of 3 images, 1 skipped
//! Skipped:
//!     trip/broken.png: Failed to decode image: ...
//! Archive → processed_batch.zip
//! ```
//!
//! # Architecture
//!
//! Each display has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure and do no I/O.

use crate::batch::{BatchEvent, BatchReport};
use crate::pipeline::{PipelineConfig, SingleOutput};
use crate::types::BatchOutcome;
use std::path::Path;

/// Human-readable size with one decimal, in KB (1 KB = 1024 bytes).
fn kilobytes(bytes: u64) -> String {
    format!("{:.1} KB", bytes as f64 / 1024.0)
}

fn outcome_line(outcome: &BatchOutcome) -> String {
    match outcome {
        BatchOutcome::Processed {
            source,
            output,
            bytes,
            quality,
            within_limit,
        } => {
            let over = if *within_limit { "" } else { ", over limit" };
            format!(
                "{source} → {output} ({}, q{quality}{over})",
                kilobytes(*bytes)
            )
        }
        BatchOutcome::Skipped { source, reason } => format!("{source} skipped: {reason}"),
    }
}

// ============================================================================
// Single
// ============================================================================

pub fn format_single_output(
    input: &Path,
    written: &Path,
    output: &SingleOutput,
    config: &PipelineConfig,
) -> Vec<String> {
    let input_name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.display().to_string());
    let image = &output.image;

    let mut detail = format!(
        "    {}x{} {} ({}), {} at quality {} (limit {})",
        config.width,
        config.height,
        image.format,
        output.mime_type,
        kilobytes(image.len() as u64),
        image.quality.value(),
        kilobytes(config.constraint.max_bytes),
    );
    if !image.within_limit {
        detail.push_str(" - over limit");
    }

    vec![
        format!("{} → {}", input_name, written.display()),
        detail,
    ]
}

pub fn print_single_output(
    input: &Path,
    written: &Path,
    output: &SingleOutput,
    config: &PipelineConfig,
) {
    for line in format_single_output(input, written, output, config) {
        println!("{}", line);
    }
}

// ============================================================================
// Batch
// ============================================================================

/// Lines for one progress event.
pub fn format_batch_event(event: &BatchEvent) -> Vec<String> {
    match event {
        BatchEvent::Started { total: 0 } => vec!["No images found in the archive".to_string()],
        BatchEvent::Started { total } => {
            let noun = if *total == 1 { "image" } else { "images" };
            vec![format!("Found {total} {noun}")]
        }
        BatchEvent::EntryFinished {
            completed,
            total,
            outcome,
        } => {
            let percent = (event.progress() * 100.0).round() as u32;
            vec![format!(
                "[{completed}/{total}] {percent:>3}% {}",
                outcome_line(outcome)
            )]
        }
        BatchEvent::Finished { .. } => Vec::new(),
    }
}

/// Closing summary: totals, skipped entries, and where the archive went.
pub fn format_batch_summary(report: &BatchReport, output: &Path) -> Vec<String> {
    if report.total == 0 {
        return vec!["Nothing to write".to_string()];
    }

    let processed = report.processed().count();
    let skipped: Vec<&BatchOutcome> = report.skipped().collect();

    let mut lines = vec![format!(
        "Processed {} of {} images, {} skipped",
        processed,
        report.total,
        skipped.len()
    )];
    if !skipped.is_empty() {
        lines.push("Skipped:".to_string());
        for outcome in skipped {
            if let BatchOutcome::Skipped { source, reason } = outcome {
                lines.push(format!("    {source}: {reason}"));
            }
        }
    }
    lines.push(format!("Archive → {}", output.display()));
    lines
}

pub fn print_batch_summary(report: &BatchReport, output: &Path) {
    for line in format_batch_summary(report, output) {
        println!("{}", line);
    }
}
