//! RAF header (index) file structures and codec
//!
//! The header file is read strictly front to back. Each section is decoded by
//! its own function over a `Read + Seek` cursor, and every section checks that
//! the bytes it declares are actually present before reading them.
//!
//! ```text
//! RAF header:
//! ├── Preamble (20 bytes)
//! │   ├── Magic number
//! │   ├── Version
//! │   ├── Manager index
//! │   ├── File list offset
//! │   └── Path list offset
//! ├── File list
//! │   ├── Count
//! │   └── Entries (16 bytes each): hash, data offset, data size, path index
//! ├── Path list
//! │   ├── Region size
//! │   ├── Count
//! │   └── Entries (8 bytes each): path offset, path length
//! └── Path strings (path length bytes each, NUL terminated)
//! ```
//!
//! All scalars are little-endian `u32`. The table offsets declared in the
//! preamble are kept verbatim and never used to seek.

use crate::RafFormat;
use crate::error::{ArchiveError, ArchiveResult};
use crate::primitives::read_u32_le_at;
use binrw::{BinRead, BinReaderExt, BinWrite, BinWriterExt};
use std::io::{Cursor, Read, Seek, SeekFrom, Write};
use tracing::{debug, trace};

/// Magic number found at the start of RAF header files
pub const RAF_MAGIC: u32 = 0x18BE_0EF0;

/// Size of the fixed preamble in bytes
pub const PREAMBLE_SIZE: u64 = 20;

/// Size of one file list record in bytes
pub const FILE_ENTRY_SIZE: u64 = 16;

/// Size of one path list record in bytes
pub const PATH_ENTRY_SIZE: u64 = 8;

/// Size of a table count field in bytes
const COUNT_SIZE: u64 = 4;

/// One stored item: its key, location in the data file and path reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, BinRead, BinWrite)]
#[brw(little)]
pub struct FileEntry {
    /// Opaque 32-bit key
    pub hash: u32,
    /// Byte offset of the compressed payload in the data file
    pub data_offset: u32,
    /// Byte length of the compressed payload
    pub data_size: u32,
    /// Index into the path table
    pub path_index: u32,
}

impl FileEntry {
    /// Create a new file entry
    pub const fn new(hash: u32, data_offset: u32, data_size: u32, path_index: u32) -> Self {
        Self {
            hash,
            data_offset,
            data_size,
            path_index,
        }
    }

    /// First byte past the payload
    pub const fn data_end(&self) -> u64 {
        self.data_offset as u64 + self.data_size as u64
    }
}

/// Location of one path string inside the path list region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, BinRead, BinWrite)]
#[brw(little)]
pub struct PathEntry {
    /// Offset of the string relative to the start of the path list region
    pub path_offset: u32,
    /// String length including its NUL terminator
    pub path_length: u32,
}

/// Fixed header scalars
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
struct Preamble {
    magic: u32,
    version: u32,
    manager_index: u32,
    file_list_offset: u32,
    path_list_offset: u32,
}

/// Decoded RAF header file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RafHeader {
    /// Magic number (not validated)
    pub magic: u32,
    /// Format version (not interpreted)
    pub version: u32,
    /// Manager index (not interpreted)
    pub manager_index: u32,
    /// Declared byte offset of the file list
    pub file_list_offset: u32,
    /// Declared byte offset of the path list
    pub path_list_offset: u32,
    /// File list in header order; the position is the entry ID
    pub files: Vec<FileEntry>,
    /// Declared byte size of the path list region
    pub path_list_size: u32,
    /// Path list, index-aligned with `path_strings`
    pub paths: Vec<PathEntry>,
    /// Raw path bytes without their NUL terminators
    pub path_strings: Vec<Vec<u8>>,
}

impl Default for RafHeader {
    fn default() -> Self {
        Self {
            magic: RAF_MAGIC,
            version: 1,
            manager_index: 0,
            file_list_offset: PREAMBLE_SIZE as u32,
            path_list_offset: (PREAMBLE_SIZE + COUNT_SIZE) as u32,
            files: Vec::new(),
            path_list_size: (COUNT_SIZE * 2) as u32,
            paths: Vec::new(),
            path_strings: Vec::new(),
        }
    }
}

/// Where the tables of a header actually sit, next to what the preamble declares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderLayout {
    /// File list offset from the preamble
    pub declared_file_list_offset: u32,
    /// File list offset implied by the preamble size
    pub actual_file_list_offset: u64,
    /// Path list offset from the preamble
    pub declared_path_list_offset: u32,
    /// Path list offset implied by the file list length
    pub actual_path_list_offset: u64,
    /// Path list region size from the header
    pub declared_path_list_size: u32,
    /// Path list region size implied by the path entries and strings
    pub actual_path_list_size: u64,
    /// Whether every path entry offset matches the packed string blob
    pub path_offsets_match: bool,
}

impl HeaderLayout {
    /// Check whether every declared offset and size matches the table layout
    pub fn is_consistent(&self) -> bool {
        u64::from(self.declared_file_list_offset) == self.actual_file_list_offset
            && u64::from(self.declared_path_list_offset) == self.actual_path_list_offset
            && u64::from(self.declared_path_list_size) == self.actual_path_list_size
            && self.path_offsets_match
    }
}

impl RafHeader {
    /// Read the magic number from the first four bytes of a header
    pub fn peek_magic(data: &[u8]) -> Option<u32> {
        read_u32_le_at(data, 0)
    }

    /// Check whether a buffer starts with the usual RAF magic number
    pub fn has_raf_magic(data: &[u8]) -> bool {
        Self::peek_magic(data) == Some(RAF_MAGIC)
    }

    /// Decode a header from a stream positioned at its first byte
    pub fn read<R: Read + Seek>(reader: &mut R) -> ArchiveResult<Self> {
        let preamble = read_preamble(reader)?;
        trace!(
            "RAF preamble: magic={:#010x} version={} manager_index={}",
            preamble.magic, preamble.version, preamble.manager_index
        );

        let files = read_file_list(reader)?;
        let (path_list_size, paths) = read_path_list(reader)?;
        let path_strings = read_path_strings(reader, &paths)?;

        for (index, file) in files.iter().enumerate() {
            if file.path_index as usize >= path_strings.len() {
                let position = PREAMBLE_SIZE + COUNT_SIZE + index as u64 * FILE_ENTRY_SIZE + 12;
                return Err(ArchiveError::malformed(
                    format!(
                        "file entry {index} references path {} but only {} paths exist",
                        file.path_index,
                        path_strings.len()
                    ),
                    position,
                ));
            }
        }

        let trailing = remaining(reader)?;
        if trailing > 0 {
            debug!("Ignoring {} trailing bytes after path strings", trailing);
        }

        debug!(
            "Decoded RAF header: {} files, {} paths",
            files.len(),
            paths.len()
        );

        Ok(Self {
            magic: preamble.magic,
            version: preamble.version,
            manager_index: preamble.manager_index,
            file_list_offset: preamble.file_list_offset,
            path_list_offset: preamble.path_list_offset,
            files,
            path_list_size,
            paths,
            path_strings,
        })
    }

    /// Encode the header in the same field order it is decoded in
    pub fn write<W: Write + Seek>(&self, writer: &mut W) -> ArchiveResult<()> {
        if self.paths.len() != self.path_strings.len() {
            return Err(ArchiveError::malformed(
                format!(
                    "{} path entries but {} path strings",
                    self.paths.len(),
                    self.path_strings.len()
                ),
                0,
            ));
        }

        let preamble = Preamble {
            magic: self.magic,
            version: self.version,
            manager_index: self.manager_index,
            file_list_offset: self.file_list_offset,
            path_list_offset: self.path_list_offset,
        };
        preamble.write(writer)?;

        writer.write_le(&table_count(self.files.len(), "file list")?)?;
        for file in &self.files {
            file.write(writer)?;
        }

        writer.write_le(&self.path_list_size)?;
        writer.write_le(&table_count(self.paths.len(), "path list")?)?;
        for path in &self.paths {
            path.write(writer)?;
        }

        for path in &self.path_strings {
            writer.write_all(path)?;
            writer.write_all(&[0])?;
        }

        Ok(())
    }

    /// Total encoded size in bytes
    pub fn encoded_len(&self) -> u64 {
        PREAMBLE_SIZE
            + COUNT_SIZE
            + self.files.len() as u64 * FILE_ENTRY_SIZE
            + COUNT_SIZE * 2
            + self.paths.len() as u64 * PATH_ENTRY_SIZE
            + self
                .path_strings
                .iter()
                .map(|s| s.len() as u64 + 1)
                .sum::<u64>()
    }

    /// Compute where the tables sit and compare with the declared values
    pub fn layout(&self) -> HeaderLayout {
        let actual_path_list_offset =
            PREAMBLE_SIZE + COUNT_SIZE + self.files.len() as u64 * FILE_ENTRY_SIZE;
        let strings_start = COUNT_SIZE * 2 + self.paths.len() as u64 * PATH_ENTRY_SIZE;

        let mut cursor = strings_start;
        let mut path_offsets_match = true;
        for path in &self.paths {
            if u64::from(path.path_offset) != cursor {
                path_offsets_match = false;
            }
            cursor += u64::from(path.path_length);
        }

        HeaderLayout {
            declared_file_list_offset: self.file_list_offset,
            actual_file_list_offset: PREAMBLE_SIZE,
            declared_path_list_offset: self.path_list_offset,
            actual_path_list_offset,
            declared_path_list_size: self.path_list_size,
            actual_path_list_size: cursor,
            path_offsets_match,
        }
    }

    /// Raw path bytes referenced by a file entry
    pub fn path_bytes_for(&self, file: &FileEntry) -> Option<&[u8]> {
        self.path_strings
            .get(file.path_index as usize)
            .map(Vec::as_slice)
    }

    /// Path referenced by a file entry, if it exists and is valid UTF-8
    pub fn path_for(&self, file: &FileEntry) -> Option<&str> {
        self.path_bytes_for(file)
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
    }
}

impl RafFormat for RafHeader {
    fn parse(data: &[u8]) -> ArchiveResult<Self> {
        Self::read(&mut Cursor::new(data))
    }

    fn build(&self) -> ArchiveResult<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::with_capacity(self.encoded_len() as usize));
        self.write(&mut cursor)?;
        Ok(cursor.into_inner())
    }
}

/// Bytes left between the cursor and the end of the stream
fn remaining<R: Seek>(reader: &mut R) -> ArchiveResult<u64> {
    let position = reader.stream_position()?;
    let end = reader.seek(SeekFrom::End(0))?;
    reader.seek(SeekFrom::Start(position))?;
    Ok(end.saturating_sub(position))
}

/// Fail with `MalformedHeader` unless `needed` bytes follow the cursor
fn ensure_remaining<R: Seek>(reader: &mut R, needed: u64, section: &str) -> ArchiveResult<u64> {
    let position = reader.stream_position()?;
    let available = remaining(reader)?;
    if available < needed {
        return Err(ArchiveError::malformed(
            format!("{section}: needs {needed} bytes but only {available} remain"),
            position,
        ));
    }
    Ok(position)
}

fn read_count<R: Read + Seek>(reader: &mut R, section: &str) -> ArchiveResult<u32> {
    let position = ensure_remaining(reader, COUNT_SIZE, section)?;
    reader
        .read_le::<u32>()
        .map_err(|e| ArchiveError::from_binrw(section, position, e))
}

fn table_count(len: usize, section: &str) -> ArchiveResult<u32> {
    u32::try_from(len)
        .map_err(|_| ArchiveError::malformed(format!("{section} has {len} entries"), 0))
}

fn read_preamble<R: Read + Seek>(reader: &mut R) -> ArchiveResult<Preamble> {
    let position = ensure_remaining(reader, PREAMBLE_SIZE, "preamble")?;
    Preamble::read(reader).map_err(|e| ArchiveError::from_binrw("preamble", position, e))
}

/// Decode the file list count and exactly that many records
fn read_file_list<R: Read + Seek>(reader: &mut R) -> ArchiveResult<Vec<FileEntry>> {
    let count = read_count(reader, "file list count")?;
    let position = ensure_remaining(
        reader,
        u64::from(count) * FILE_ENTRY_SIZE,
        "file list entries",
    )?;

    let mut files = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let file = FileEntry::read(reader)
            .map_err(|e| ArchiveError::from_binrw("file list entries", position, e))?;
        files.push(file);
    }

    trace!("Read {} file entries", files.len());
    Ok(files)
}

/// Decode the path list region size, its count and exactly that many records
fn read_path_list<R: Read + Seek>(reader: &mut R) -> ArchiveResult<(u32, Vec<PathEntry>)> {
    let path_list_size = read_count(reader, "path list size")?;
    let count = read_count(reader, "path list count")?;
    let position = ensure_remaining(
        reader,
        u64::from(count) * PATH_ENTRY_SIZE,
        "path list entries",
    )?;

    let mut paths = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let path = PathEntry::read(reader)
            .map_err(|e| ArchiveError::from_binrw("path list entries", position, e))?;
        paths.push(path);
    }

    trace!("Read {} path entries", paths.len());
    Ok((path_list_size, paths))
}

/// Read one NUL-terminated string per path entry, using the declared lengths
///
/// The bytes are kept as stored so that any encoding round-trips unchanged.
fn read_path_strings<R: Read + Seek>(
    reader: &mut R,
    paths: &[PathEntry],
) -> ArchiveResult<Vec<Vec<u8>>> {
    let total: u64 = paths.iter().map(|p| u64::from(p.path_length)).sum();
    ensure_remaining(reader, total, "path strings")?;

    let mut strings = Vec::with_capacity(paths.len());
    for (index, path) in paths.iter().enumerate() {
        let position = reader.stream_position()?;
        if path.path_length == 0 {
            return Err(ArchiveError::malformed(
                format!("path {index} has zero length and no terminator"),
                position,
            ));
        }

        let mut buf = vec![0u8; path.path_length as usize];
        reader.read_exact(&mut buf)?;

        if buf.pop() != Some(0) {
            return Err(ArchiveError::malformed(
                format!("path {index} is not NUL terminated"),
                position,
            ));
        }

        strings.push(buf);
    }

    Ok(strings)
}
