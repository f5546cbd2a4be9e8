//! Zip reading (lazy) and the output archive writer.

use super::{ArchiveEntry, ArchiveError};
use crate::naming::has_image_extension;
use std::collections::HashSet;
use std::io::{Cursor, Read, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Lazily yields image entries of a zip held in memory.
///
/// Names are inspected from the central directory; an entry's data is only
/// decompressed when that entry is yielded.
pub struct ZipEntries {
    archive: ZipArchive<Cursor<Vec<u8>>>,
    next_index: usize,
}

impl ZipEntries {
    pub fn new(bytes: Vec<u8>) -> Result<Self, ArchiveError> {
        Ok(Self {
            archive: ZipArchive::new(Cursor::new(bytes))?,
            next_index: 0,
        })
    }

    fn read_entry(&mut self, index: usize, name: String) -> Result<ArchiveEntry, ArchiveError> {
        let mut file = self.archive.by_index(index)?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)
            .map_err(|source| ArchiveError::Read {
                name: name.clone(),
                source,
            })?;
        Ok(ArchiveEntry { name, bytes })
    }
}

impl Iterator for ZipEntries {
    type Item = Result<ArchiveEntry, ArchiveError>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.next_index < self.archive.len() {
            let index = self.next_index;
            self.next_index += 1;

            let Some(name) = self.archive.name_for_index(index) else {
                continue;
            };
            if name.ends_with('/') || !has_image_extension(name) {
                continue;
            }
            let name = name.to_string();
            return Some(self.read_entry(index, name));
        }
        None
    }
}

/// Deflate zip built up entry by entry, sealed once with [`finish`](Self::finish).
///
/// Entry names are unique; adding a name twice is an error and leaves the
/// first entry in place.
pub struct OutputArchive {
    writer: ZipWriter<Cursor<Vec<u8>>>,
    names: HashSet<String>,
}

impl OutputArchive {
    pub fn new() -> Self {
        Self {
            writer: ZipWriter::new(Cursor::new(Vec::new())),
            names: HashSet::new(),
        }
    }

    pub fn add(&mut self, name: &str, bytes: &[u8]) -> Result<(), ArchiveError> {
        if self.names.contains(name) {
            return Err(ArchiveError::DuplicateEntry(name.to_string()));
        }
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        self.writer
            .start_file(name, options)
            .map_err(ArchiveError::Write)?;
        self.writer
            .write_all(bytes)
            .map_err(|e| ArchiveError::Write(e.into()))?;
        self.names.insert(name.to_string());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Write the central directory and return the archive bytes.
    pub fn finish(self) -> Result<Vec<u8>, ArchiveError> {
        let cursor = self.writer.finish().map_err(ArchiveError::Write)?;
        Ok(cursor.into_inner())
    }
}

impl Default for OutputArchive {
    fn default() -> Self {
        Self::new()
    }
}
