//! Data file access
//!
//! The data file has no framing of its own. Every payload is addressed by the
//! `(data_offset, data_size)` pair of its file entry, so entries can be read in
//! any order.

use crate::error::{ArchiveError, ArchiveResult};
use crate::header::FileEntry;
use crate::packing::packed_extent;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;
use tracing::{debug, trace};

/// Data file reader for positioned payload access
pub struct DataFile<R: Read + Seek> {
    /// Underlying reader
    reader: R,
    /// Total stream length
    len: u64,
}

impl<R: Read + Seek> DataFile<R> {
    /// Create new data file reader
    pub fn new(mut reader: R) -> ArchiveResult<Self> {
        let len = reader.seek(SeekFrom::End(0))?;
        Ok(Self { reader, len })
    }

    /// Total length of the data stream
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Check if the data stream is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Read exactly `size` bytes starting at `offset`
    pub fn read_at_offset(&mut self, offset: u64, size: u64) -> ArchiveResult<Vec<u8>> {
        self.reader.seek(SeekFrom::Start(offset))?;

        let mut data = vec![
            0u8;
            usize::try_from(size).map_err(|_| ArchiveError::ContentTooLarge {
                size: usize::MAX,
            })?
        ];
        self.reader.read_exact(&mut data)?;

        Ok(data)
    }

    /// Read the payload of one file entry
    pub fn read_entry(&mut self, index: usize, entry: &FileEntry) -> ArchiveResult<Vec<u8>> {
        if entry.data_end() > self.len {
            return Err(ArchiveError::EntryOutOfBounds {
                index,
                offset: entry.data_offset,
                size: entry.data_size,
                data_len: self.len,
            });
        }

        trace!(
            "Reading entry {} at offset {} ({} bytes)",
            index, entry.data_offset, entry.data_size
        );
        self.read_at_offset(u64::from(entry.data_offset), u64::from(entry.data_size))
    }
}

impl DataFile<File> {
    /// Open data file from path
    pub fn open<P: AsRef<Path>>(path: P) -> ArchiveResult<Self> {
        let file = File::open(path)?;
        Self::new(file)
    }
}

/// Read every entry's payload, index-aligned with `files`
pub fn load_contents<R: Read + Seek>(
    files: &[FileEntry],
    reader: R,
) -> ArchiveResult<Vec<Vec<u8>>> {
    let mut data_file = DataFile::new(reader)?;

    let contents = files
        .iter()
        .enumerate()
        .map(|(index, entry)| data_file.read_entry(index, entry))
        .collect::<ArchiveResult<Vec<_>>>()?;

    debug!(
        "Loaded {} payloads from {} byte data file",
        contents.len(),
        data_file.len()
    );
    Ok(contents)
}

/// Write every payload at its entry's offset, returning the image length
///
/// Payloads are streamed in offset order with zero runs written into the gaps,
/// so the image never has to exist in memory. The image ends at the furthest
/// payload end. Where payloads overlap they are rewritten in index order, so
/// the later entry wins.
pub fn store_contents<W: Write + Seek>(
    files: &[FileEntry],
    contents: &[Vec<u8>],
    mut writer: W,
) -> ArchiveResult<u64> {
    if files.len() != contents.len() {
        return Err(ArchiveError::ContentsNotLoaded {
            expected: files.len(),
            actual: contents.len(),
        });
    }
    for (index, (entry, content)) in files.iter().zip(contents).enumerate() {
        if content.len() != entry.data_size as usize {
            return Err(ArchiveError::ContentSizeMismatch {
                index,
                declared: entry.data_size,
                actual: content.len(),
            });
        }
    }

    let base = writer.stream_position()?;
    let mut order: Vec<usize> = (0..files.len()).collect();
    order.sort_by_key(|&index| files[index].data_offset);

    let mut end = 0u64;
    let mut overlapping = false;
    for &index in &order {
        let entry = &files[index];
        let offset = u64::from(entry.data_offset);
        if offset > end {
            trace!("Zero-filling {} byte gap at offset {}", offset - end, end);
            io::copy(&mut io::repeat(0).take(offset - end), &mut writer)?;
            end = offset;
        } else if offset < end && entry.data_size > 0 {
            overlapping = true;
        }

        if entry.data_end() > end {
            let skip = (end - offset) as usize;
            writer.write_all(&contents[index][skip..])?;
            end = entry.data_end();
        }
    }

    let extent = packed_extent(files);
    if overlapping {
        debug!("Overlapping payloads, rewriting in index order");
        for (entry, content) in files.iter().zip(contents) {
            writer.seek(SeekFrom::Start(base + u64::from(entry.data_offset)))?;
            writer.write_all(content)?;
        }
        writer.seek(SeekFrom::Start(base + extent))?;
    }
    writer.flush()?;

    debug!("Stored {} payloads in {} bytes", files.len(), extent);
    Ok(extent)
}
