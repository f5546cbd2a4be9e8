//! Batch processing of every image inside an archive.
//!
//! Reads a `.zip` or `.7z`, runs the [single-image pipeline](crate::pipeline)
//! on each image entry in archive order, and packs the results into one
//! Deflate zip. A failing entry is recorded as
//! [`BatchOutcome::Skipped`] and never stops the batch; only an unreadable
//! archive does.
//!
//! ## Output Structure
//!
//! ```text
//! photos.7z                       processed_batch.zip
//! ├── cover.png            →      ├── cover.webp
//! ├── 2024/trip/a.JPG      →      ├── 2024/trip/a.webp
//! ├── 2024/trip/broken.png        │   (skipped: decode error)
//! └── notes.txt                   └── (not an image, never read)
//! ```
//!
//! ## Progress
//!
//! [`BatchEvent`]s are sent over an optional `std::sync::mpsc` channel: one
//! `Started`, one `EntryFinished` per entry, and one `Finished`.

use crate::archive::{self, ArchiveEntry, ArchiveError, ArchiveKind, OutputArchive};
use crate::imaging::{ImageBackend, RustBackend};
use crate::naming::batch_entry_name;
use crate::pipeline::{PipelineConfig, process_image};
use crate::types::BatchOutcome;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{info, warn};

/// Default name of the batch output archive.
pub const DEFAULT_OUTPUT_NAME: &str = "processed_batch.zip";

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),
    #[error("Cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Progress notifications for a running batch.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchEvent {
    Started {
        total: usize,
    },
    EntryFinished {
        completed: usize,
        total: usize,
        outcome: BatchOutcome,
    },
    Finished {
        processed: usize,
        skipped: usize,
    },
}

impl BatchEvent {
    /// Fraction of entries done, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        match self {
            Self::Started { total } => {
                if *total == 0 {
                    1.0
                } else {
                    0.0
                }
            }
            Self::EntryFinished {
                completed, total, ..
            } => *completed as f64 / (*total).max(1) as f64,
            Self::Finished { .. } => 1.0,
        }
    }
}

/// Result of a whole batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    /// Number of image entries found in the archive.
    pub total: usize,
    /// One outcome per entry, in archive order.
    pub outcomes: Vec<BatchOutcome>,
    /// Sealed output zip; `None` when the archive held no images.
    #[serde(skip)]
    pub archive: Option<Vec<u8>>,
}

impl BatchReport {
    pub fn processed(&self) -> impl Iterator<Item = &BatchOutcome> {
        self.outcomes.iter().filter(|o| o.is_processed())
    }

    /// Entries that failed, with the reason they failed.
    pub fn skipped(&self) -> impl Iterator<Item = &BatchOutcome> {
        self.outcomes.iter().filter(|o| !o.is_processed())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Running,
    Done,
}

/// A batch over a fixed work list, advanced one entry at a time.
pub struct BatchRun<'a, B: ImageBackend> {
    backend: &'a B,
    config: &'a PipelineConfig,
    pending: std::vec::IntoIter<ArchiveEntry>,
    total: usize,
    outcomes: Vec<BatchOutcome>,
    output: OutputArchive,
}

impl<'a, B: ImageBackend> BatchRun<'a, B> {
    pub fn new(backend: &'a B, config: &'a PipelineConfig, work: Vec<ArchiveEntry>) -> Self {
        Self {
            backend,
            config,
            total: work.len(),
            pending: work.into_iter(),
            outcomes: Vec::new(),
            output: OutputArchive::new(),
        }
    }

    pub fn state(&self) -> BatchState {
        if self.completed() < self.total {
            BatchState::Running
        } else {
            BatchState::Done
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn completed(&self) -> usize {
        self.outcomes.len()
    }

    /// Process the next entry. Returns `None` once the batch is done.
    ///
    /// Per-entry failures become [`BatchOutcome::Skipped`]; only a failure to
    /// write the output archive is an error.
    pub fn step(&mut self) -> Result<Option<BatchOutcome>, ArchiveError> {
        let Some(entry) = self.pending.next() else {
            return Ok(None);
        };

        let outcome = match process_image(self.backend, &entry.bytes, self.config) {
            Ok(encoded) => {
                let output_name = batch_entry_name(&entry.name, encoded.format);
                match self.output.add(&output_name, &encoded.bytes) {
                    Ok(()) => BatchOutcome::Processed {
                        source: entry.name,
                        output: output_name,
                        bytes: encoded.bytes.len() as u64,
                        quality: encoded.quality.value(),
                        within_limit: encoded.within_limit,
                    },
                    Err(e @ ArchiveError::DuplicateEntry(_)) => skip(entry.name, &e),
                    Err(e) => return Err(e),
                }
            }
            Err(e) => skip(entry.name, &e),
        };

        self.outcomes.push(outcome.clone());
        Ok(Some(outcome))
    }

    /// Seal the output archive and produce the report.
    pub fn seal(self) -> Result<BatchReport, ArchiveError> {
        let archive = if self.total == 0 {
            None
        } else {
            Some(self.output.finish()?)
        };
        Ok(BatchReport {
            total: self.total,
            outcomes: self.outcomes,
            archive,
        })
    }
}

fn skip(source: String, cause: &dyn std::error::Error) -> BatchOutcome {
    warn!(entry = %source, error = %cause, "skipping entry");
    BatchOutcome::Skipped {
        source,
        reason: cause.to_string(),
    }
}

fn emit(progress: Option<&Sender<BatchEvent>>, event: BatchEvent) {
    if let Some(tx) = progress {
        // A closed receiver only means nobody is watching.
        let _ = tx.send(event);
    }
}

/// Process an archive file and write the output zip, using the production backend.
pub fn process_archive(
    archive_path: &Path,
    output_path: &Path,
    config: &PipelineConfig,
    progress: Option<Sender<BatchEvent>>,
) -> Result<BatchReport, BatchError> {
    let bytes = std::fs::read(archive_path).map_err(|source| BatchError::Read {
        path: archive_path.to_path_buf(),
        source,
    })?;
    let name = archive_path.to_string_lossy();
    let report = process_archive_with_backend(&RustBackend::new(), &name, bytes, config, progress)?;

    if let Some(archive) = &report.archive {
        std::fs::write(output_path, archive).map_err(|source| BatchError::Write {
            path: output_path.to_path_buf(),
            source,
        })?;
    }
    Ok(report)
}

/// Process archive bytes with a specific backend (allows testing with mock).
///
/// `archive_name` selects the container kind by its suffix.
pub fn process_archive_with_backend(
    backend: &impl ImageBackend,
    archive_name: &str,
    bytes: Vec<u8>,
    config: &PipelineConfig,
    progress: Option<Sender<BatchEvent>>,
) -> Result<BatchReport, BatchError> {
    let kind = ArchiveKind::from_name(archive_name)?;
    let work = archive::open(kind, bytes)?.collect::<Result<Vec<_>, _>>()?;
    let progress = progress.as_ref();

    let mut run = BatchRun::new(backend, config, work);
    let total = run.total();
    info!(archive = archive_name, total, "batch started");
    emit(progress, BatchEvent::Started { total });

    if total == 0 {
        warn!(archive = archive_name, "no images found in archive");
    }

    while let Some(outcome) = run.step()? {
        emit(
            progress,
            BatchEvent::EntryFinished {
                completed: run.completed(),
                total,
                outcome,
            },
        );
    }

    let report = run.seal()?;
    let processed = report.processed().count();
    let skipped = report.skipped().count();
    info!(archive = archive_name, processed, skipped, "batch finished");
    emit(progress, BatchEvent::Finished { processed, skipped });
    Ok(report)
}

/// Write a report as pretty-printed JSON.
pub fn write_report(report: &BatchReport, path: &Path) -> Result<(), BatchError> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json).map_err(|source| BatchError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::MockBackend;
    use crate::imaging::{Dimensions, OutputFormat, SizeConstraint};
    use crate::test_helpers::{
        gradient_jpeg, gradient_png, sevenz_of, zip_names, zip_of, zip_read,
    };
    use tempfile::TempDir;

    fn config(format: OutputFormat) -> PipelineConfig {
        PipelineConfig {
            width: 40,
            height: 30,
            constraint: SizeConstraint::from_kilobytes(format, 100),
            logo: None,
        }
    }

    fn ok(width: u32, height: u32) -> Result<Dimensions, String> {
        Ok(Dimensions { width, height })
    }

    fn entry(name: &str) -> ArchiveEntry {
        ArchiveEntry {
            name: name.into(),
            bytes: vec![0; 8],
        }
    }

    // =========================================================================
    // BatchRun tests (mock backend)
    // =========================================================================

    #[test]
    fn run_moves_from_running_to_done() {
        let backend = MockBackend::new().with_images(vec![ok(10, 10), ok(10, 10)]);
        let cfg = config(OutputFormat::Webp);
        let mut run = BatchRun::new(&backend, &cfg, vec![entry("a.png"), entry("b.png")]);

        assert_eq!(run.state(), BatchState::Running);
        assert!(run.step().unwrap().is_some());
        assert_eq!(run.state(), BatchState::Running);
        assert!(run.step().unwrap().is_some());
        assert_eq!(run.state(), BatchState::Done);
        assert!(run.step().unwrap().is_none());
    }

    #[test]
    fn empty_run_is_done_and_seals_without_archive() {
        let backend = MockBackend::new();
        let cfg = config(OutputFormat::Webp);
        let run = BatchRun::new(&backend, &cfg, Vec::new());
        assert_eq!(run.state(), BatchState::Done);

        let report = run.seal().unwrap();
        assert_eq!(report.total, 0);
        assert!(report.archive.is_none());
    }

    #[test]
    fn failing_entry_is_skipped_and_batch_continues() {
        let images = vec![ok(10, 10), Err("corrupt".into()), ok(10, 10)];
        let backend = MockBackend::new().with_images(images);
        let cfg = config(OutputFormat::Webp);
        let mut run = BatchRun::new(
            &backend,
            &cfg,
            vec![entry("one.png"), entry("two.png"), entry("dir/three.jpg")],
        );
        while run.step().unwrap().is_some() {}
        let report = run.seal().unwrap();

        assert_eq!(report.total, 3);
        assert_eq!(report.processed().count(), 2);
        let skipped: Vec<&BatchOutcome> = report.skipped().collect();
        assert_eq!(skipped.len(), 1);
        let BatchOutcome::Skipped { source, reason } = skipped[0] else {
            panic!("expected a skipped outcome, got {:?}", skipped[0]);
        };
        assert_eq!(source, "two.png");
        assert!(reason.contains("corrupt"), "{reason}");

        let names = zip_names(report.archive.as_deref().unwrap());
        assert_eq!(names, vec!["one.webp", "dir/three.webp"]);
    }

    #[test]
    fn colliding_output_names_skip_the_later_entry() {
        let backend = MockBackend::new().with_images(vec![ok(10, 10), ok(10, 10)]);
        let cfg = config(OutputFormat::Png);
        let mut run = BatchRun::new(&backend, &cfg, vec![entry("a.jpg"), entry("a.webp")]);
        while run.step().unwrap().is_some() {}
        let report = run.seal().unwrap();

        assert!(matches!(
            &report.outcomes[0],
            BatchOutcome::Processed { output, .. } if output == "a.png"
        ));
        let BatchOutcome::Skipped { source, reason } = &report.outcomes[1] else {
            panic!("expected a skipped outcome, got {:?}", report.outcomes[1]);
        };
        assert_eq!(source, "a.webp");
        assert!(reason.contains("duplicate"), "{reason}");
        assert_eq!(zip_names(report.archive.as_deref().unwrap()), vec!["a.png"]);
    }

    #[test]
    fn processed_outcome_records_encoding() {
        // Sizes: quality × 100, ceiling 5 KB → first fit at quality 50
        let backend = MockBackend::new().with_images(vec![ok(10, 10)]);
        let cfg = PipelineConfig {
            constraint: SizeConstraint::from_kilobytes(OutputFormat::Webp, 5),
            ..config(OutputFormat::Webp)
        };
        let mut run = BatchRun::new(&backend, &cfg, vec![entry("x.png")]);
        let outcome = run.step().unwrap().unwrap();
        assert_eq!(
            outcome,
            BatchOutcome::Processed {
                source: "x.png".into(),
                output: "x.webp".into(),
                bytes: 5000,
                quality: 50,
                within_limit: true,
            }
        );
    }

    // =========================================================================
    // process_archive_with_backend tests
    // =========================================================================

    #[test]
    fn unsupported_archive_name_errors() {
        let backend = MockBackend::new();
        let result = process_archive_with_backend(
            &backend,
            "photos.rar",
            vec![],
            &config(OutputFormat::Webp),
            None,
        );
        assert!(matches!(
            result,
            Err(BatchError::Archive(ArchiveError::UnsupportedKind(_)))
        ));
    }

    #[test]
    fn corrupt_archive_aborts() {
        let backend = MockBackend::new();
        let result = process_archive_with_backend(
            &backend,
            "photos.zip",
            b"PK garbage".to_vec(),
            &config(OutputFormat::Webp),
            None,
        );
        assert!(matches!(result, Err(BatchError::Archive(_))));
    }

    #[test]
    fn archive_without_images_produces_no_output() {
        let backend = MockBackend::new();
        let archive = zip_of(&[("readme.txt", b"hi"), ("docs/", b"")]);
        let (tx, rx) = std::sync::mpsc::channel();

        let report = process_archive_with_backend(
            &backend,
            "docs.zip",
            archive,
            &config(OutputFormat::Webp),
            Some(tx),
        )
        .unwrap();
        assert_eq!(report.total, 0);
        assert!(report.archive.is_none());

        let events: Vec<BatchEvent> = rx.iter().collect();
        assert_eq!(
            events,
            vec![
                BatchEvent::Started { total: 0 },
                BatchEvent::Finished {
                    processed: 0,
                    skipped: 0
                },
            ]
        );
    }

    #[test]
    fn progress_events_are_monotonic_and_end_at_one() {
        let images = vec![ok(5, 5), Err("bad".into()), ok(5, 5), ok(5, 5)];
        let backend = MockBackend::new().with_images(images);
        let archive = zip_of(&[
            ("a.png", b"1"),
            ("b.png", b"2"),
            ("skip.txt", b"3"),
            ("c.png", b"4"),
            ("d.png", b"5"),
        ]);
        let (tx, rx) = std::sync::mpsc::channel();
        process_archive_with_backend(
            &backend,
            "x.zip",
            archive,
            &config(OutputFormat::Webp),
            Some(tx),
        )
        .unwrap();

        let events: Vec<BatchEvent> = rx.iter().collect();
        assert_eq!(events.len(), 6);
        assert_eq!(events[0], BatchEvent::Started { total: 4 });

        let fractions: Vec<f64> = events.iter().map(BatchEvent::progress).collect();
        assert!(fractions.windows(2).all(|w| w[0] <= w[1]), "{fractions:?}");
        assert_eq!(fractions[4], 1.0);
        assert_eq!(
            events[5],
            BatchEvent::Finished {
                processed: 3,
                skipped: 1
            }
        );
    }

    // =========================================================================
    // Real backend tests
    // =========================================================================

    #[test]
    fn zip_batch_with_one_corrupt_entry() {
        let png = gradient_png(64, 48);
        let jpeg = gradient_jpeg(50, 50);
        let archive = zip_of(&[
            ("cover.png", &png),
            ("2024/trip/a.JPG", &jpeg),
            ("2024/trip/broken.png", b"\x89PNG\r\n\x1a\nnot really"),
            ("notes.txt", b"ignore me"),
        ]);

        let report = process_archive_with_backend(
            &RustBackend::new(),
            "photos.zip",
            archive,
            &config(OutputFormat::Webp),
            None,
        )
        .unwrap();

        assert_eq!(report.total, 3);
        let out = report.archive.as_deref().unwrap();
        assert_eq!(zip_names(out), vec!["cover.webp", "2024/trip/a.webp"]);

        let decoded = image::load_from_memory(&zip_read(out, "2024/trip/a.webp")).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (40, 30));
    }

    #[test]
    fn sevenz_batch_repacks_as_zip() {
        let png = gradient_png(30, 30);
        let archive = sevenz_of(&[("set/one.png", &png), ("set/info.txt", b"txt")]);

        let report = process_archive_with_backend(
            &RustBackend::new(),
            "set.7Z",
            archive,
            &config(OutputFormat::Jpeg),
            None,
        )
        .unwrap();

        assert_eq!(report.total, 1);
        assert_eq!(
            zip_names(report.archive.as_deref().unwrap()),
            vec!["set/one.jpg"]
        );
    }

    #[test]
    fn sevenz_batch_keeps_container_order() {
        let png = gradient_png(12, 12);
        let archive = sevenz_of(&[("z.png", &png), ("m/b.png", &png), ("a.png", &png)]);

        let report = process_archive_with_backend(
            &RustBackend::new(),
            "order.7z",
            archive,
            &config(OutputFormat::Png),
            None,
        )
        .unwrap();

        let sources: Vec<&str> = report.outcomes.iter().map(BatchOutcome::source).collect();
        assert_eq!(sources, vec!["z.png", "m/b.png", "a.png"]);
        assert_eq!(
            zip_names(report.archive.as_deref().unwrap()),
            vec!["z.png", "m/b.png", "a.png"]
        );
    }

    #[test]
    fn process_archive_writes_output_and_report() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("in.zip");
        std::fs::write(&input, zip_of(&[("p.png", &gradient_png(20, 20))])).unwrap();
        let output = tmp.path().join(DEFAULT_OUTPUT_NAME);
        let report_path = tmp.path().join("report.json");

        let report = process_archive(&input, &output, &config(OutputFormat::Png), None).unwrap();
        write_report(&report, &report_path).unwrap();

        assert_eq!(zip_names(&std::fs::read(&output).unwrap()), vec!["p.png"]);

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
        assert_eq!(json["total"], 1);
        assert_eq!(json["outcomes"][0]["status"], "processed");
        assert_eq!(json["outcomes"][0]["output"], "p.png");
        assert!(json.get("archive").is_none());
    }

    #[test]
    fn process_archive_empty_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("empty.zip");
        std::fs::write(&input, zip_of(&[("a.txt", b"x")])).unwrap();
        let output = tmp.path().join("out.zip");

        let report = process_archive(&input, &output, &config(OutputFormat::Webp), None).unwrap();
        assert_eq!(report.total, 0);
        assert!(!output.exists());
    }

    #[test]
    fn process_archive_missing_file() {
        let tmp = TempDir::new().unwrap();
        let result = process_archive(
            &tmp.path().join("missing.zip"),
            &tmp.path().join("out.zip"),
            &config(OutputFormat::Webp),
            None,
        );
        assert!(matches!(result, Err(BatchError::Read { .. })));
    }
}
