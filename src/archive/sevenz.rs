//! 7z reading.
//!
//! The decoder hands out entries through a callback in solid-block order, so
//! the whole archive is walked once up front and the image entries retained.

use super::{ArchiveEntry, ArchiveError};
use crate::naming::has_image_extension;
use sevenz_rust::{Password, SevenZReader};
use std::io::{self, Cursor};

pub(super) fn read_images(bytes: Vec<u8>) -> Result<Vec<ArchiveEntry>, ArchiveError> {
    let len = bytes.len() as u64;
    let mut reader = SevenZReader::new(Cursor::new(bytes), len, Password::empty())?;

    let mut images = Vec::new();
    reader.for_each_entries(|entry, data| {
        if entry.is_directory() || !has_image_extension(entry.name()) {
            io::copy(data, &mut io::sink())?;
            return Ok(true);
        }
        let mut buf = Vec::new();
        data.read_to_end(&mut buf)?;
        images.push(ArchiveEntry {
            name: entry.name().to_string(),
            bytes: buf,
        });
        Ok(true)
    })?;

    Ok(images)
}
