//! Archive extraction and packaging.
//!
//! Both supported containers are read through the same single-pass iterator,
//! [`ImageEntries`], which yields only entries whose names carry an image
//! extension (see [`has_image_extension`](crate::naming::has_image_extension)).
//!
//! | Kind | Reader | Laziness |
//! |---|---|---|
//! | `.zip` | `zip::ZipArchive` | entry bytes read when yielded |
//! | `.7z` | `sevenz_rust::SevenZReader` | decoded while opening |
//!
//! Output is always a Deflate zip built with [`OutputArchive`].

mod sevenz;
mod zip;

pub use self::zip::{OutputArchive, ZipEntries};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("unsupported archive '{0}' (expected a .zip or .7z file)")]
    UnsupportedKind(String),
    #[error("invalid zip archive: {0}")]
    Zip(#[from] ::zip::result::ZipError),
    #[error("invalid 7z archive: {0}")]
    SevenZip(#[from] sevenz_rust::Error),
    #[error("failed to read entry '{name}': {source}")]
    Read {
        name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("duplicate output entry '{0}'")]
    DuplicateEntry(String),
    #[error("failed to write output archive: {0}")]
    Write(#[source] ::zip::result::ZipError),
}

/// Container kinds the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    SevenZip,
}

impl ArchiveKind {
    /// Pick the kind from a file name suffix, ignoring case.
    pub fn from_name(name: &str) -> Result<Self, ArchiveError> {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".zip") {
            Ok(Self::Zip)
        } else if lower.ends_with(".7z") {
            Ok(Self::SevenZip)
        } else {
            Err(ArchiveError::UnsupportedKind(name.to_string()))
        }
    }
}

/// One image file pulled out of an archive.
#[derive(Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Full name inside the archive, `/`-separated.
    pub name: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for ArchiveEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveEntry")
            .field("name", &self.name)
            .field("bytes", &format_args!("<{} bytes>", self.bytes.len()))
            .finish()
    }
}

/// Single-pass sequence of image entries from either container kind.
pub enum ImageEntries {
    Zip(ZipEntries),
    SevenZip(std::vec::IntoIter<ArchiveEntry>),
}

impl Iterator for ImageEntries {
    type Item = Result<ArchiveEntry, ArchiveError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Self::Zip(entries) => entries.next(),
            Self::SevenZip(entries) => entries.next().map(Ok),
        }
    }
}

/// Open an archive and return its image entries in container order.
pub fn open(kind: ArchiveKind, bytes: Vec<u8>) -> Result<ImageEntries, ArchiveError> {
    match kind {
        ArchiveKind::Zip => Ok(ImageEntries::Zip(ZipEntries::new(bytes)?)),
        ArchiveKind::SevenZip => Ok(ImageEntries::SevenZip(
            sevenz::read_images(bytes)?.into_iter(),
        )),
    }
}
