//! The single-image pipeline: normalize → watermark → size-constrained encode.
//!
//! [`PipelineConfig`] is built once per run and shared by every image, in
//! single mode and in batch mode alike.

use crate::config::{ConfigError, RunConfig};
use crate::imaging::{
    BackendError, EncodedImage, ImageBackend, Logo, RustBackend, SizeConstraint, apply_logo,
    encode_within_limit, normalize,
};
use crate::naming::single_output_name;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum PipelineError {
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
    #[error("Image processing failed: {0}")]
    Imaging(#[from] BackendError),
}

/// Everything the pipeline needs to process one image. Immutable per run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub width: u32,
    pub height: u32,
    pub constraint: SizeConstraint,
    pub logo: Option<Logo>,
}

impl PipelineConfig {
    /// Build from a validated run config, reading the watermark file once.
    pub fn from_run_config(config: &RunConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            width: config.output.width,
            height: config.output.height,
            constraint: config.size_constraint(),
            logo: config.read_logo()?,
        })
    }
}

/// A processed image ready to be written out under `file_name`.
#[derive(Debug, Clone)]
pub struct SingleOutput {
    pub file_name: String,
    pub mime_type: &'static str,
    pub image: EncodedImage,
}

/// Run the full pipeline on one image's bytes.
pub fn process_image(
    backend: &impl ImageBackend,
    bytes: &[u8],
    config: &PipelineConfig,
) -> Result<EncodedImage, BackendError> {
    let normalized = normalize(backend, bytes, config.width, config.height)?;
    let composited = apply_logo(backend, normalized, config.logo.as_ref());
    encode_within_limit(backend, composited, &config.constraint)
}

/// Process one named image and pick its single-mode output name.
pub fn process_single(
    backend: &impl ImageBackend,
    input_name: &str,
    bytes: &[u8],
    config: &PipelineConfig,
) -> Result<SingleOutput, BackendError> {
    let image = process_image(backend, bytes, config)?;
    Ok(SingleOutput {
        file_name: single_output_name(input_name, image.format),
        mime_type: image.format.mime_type(),
        image,
    })
}

/// Process an image file into `out_dir` with the production backend.
///
/// Returns the processed output together with the path it was written to.
pub fn process_file(
    input: &Path,
    out_dir: &Path,
    config: &PipelineConfig,
) -> Result<(SingleOutput, PathBuf), PipelineError> {
    process_file_with_backend(&RustBackend::new(), input, out_dir, config)
}

/// Like [`process_file`], with an explicit backend.
pub fn process_file_with_backend(
    backend: &impl ImageBackend,
    input: &Path,
    out_dir: &Path,
    config: &PipelineConfig,
) -> Result<(SingleOutput, PathBuf), PipelineError> {
    let bytes = fs::read(input).map_err(|source| PipelineError::Read {
        path: input.to_path_buf(),
        source,
    })?;
    let input_name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let output = process_single(backend, &input_name, &bytes, config)?;

    let write_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source: std::io::Error| PipelineError::Write { path, source }
    };
    fs::create_dir_all(out_dir).map_err(write_err(out_dir))?;
    let out_path = out_dir.join(&output.file_name);
    fs::write(&out_path, &output.image.bytes).map_err(write_err(&out_path))?;

    info!(
        input = %input.display(),
        output = %out_path.display(),
        bytes = output.image.len(),
        quality = output.image.quality.value(),
        "image processed"
    );
    Ok((output, out_path))
}
