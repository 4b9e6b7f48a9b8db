//! RAF archive builder
//!
//! Produces a well-formed archive from a list of logical paths and raw
//! payloads. Payloads are compressed and packed back to back from offset zero
//! in insertion order, each path gets its own path list entry, and the
//! preamble offsets and path list size are derived from the table sizes.
//!
//! # Example
//!
//! ```rust
//! use raf_archive::RafArchiveBuilder;
//!
//! let archive = RafArchiveBuilder::new()
//!     .add_file("DATA/Menu/Hand1.tga", 0x0A1B_2C3D, b"first".to_vec())
//!     .add_file("DATA/Menu/Hand2.tga", 0x0A1B_2C3E, b"second".to_vec())
//!     .build()?;
//!
//! assert_eq!(archive.entry_count(), 2);
//! assert!(archive.check_packing().is_ok());
//! assert!(archive.header().layout().is_consistent());
//! # Ok::<(), raf_archive::ArchiveError>(())
//! ```

use crate::archive::RafArchive;
use crate::compression::{DEFAULT_COMPRESSION_LEVEL, compress};
use crate::error::{ArchiveError, ArchiveResult};
use crate::header::{
    FILE_ENTRY_SIZE, FileEntry, PATH_ENTRY_SIZE, PREAMBLE_SIZE, PathEntry, RafHeader,
};
use tracing::debug;

/// One file queued for the archive
#[derive(Debug, Clone)]
struct PendingFile {
    path: String,
    hash: u32,
    data: Vec<u8>,
}

/// Builder for RAF archives
#[derive(Debug, Clone)]
pub struct RafArchiveBuilder {
    magic: u32,
    version: u32,
    manager_index: u32,
    compression_level: u32,
    files: Vec<PendingFile>,
}

impl Default for RafArchiveBuilder {
    fn default() -> Self {
        let header = RafHeader::default();
        Self {
            magic: header.magic,
            version: header.version,
            manager_index: header.manager_index,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            files: Vec::new(),
        }
    }
}

impl RafArchiveBuilder {
    /// Create a builder with default header scalars
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the version scalar
    pub fn version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Set the manager index scalar
    pub fn manager_index(mut self, manager_index: u32) -> Self {
        self.manager_index = manager_index;
        self
    }

    /// Set the magic number
    pub fn magic(mut self, magic: u32) -> Self {
        self.magic = magic;
        self
    }

    /// Set the zlib level used for payloads
    pub fn compression_level(mut self, level: u32) -> Self {
        self.compression_level = level;
        self
    }

    /// Queue a file with its opaque hash and uncompressed contents
    pub fn add_file(mut self, path: impl Into<String>, hash: u32, data: Vec<u8>) -> Self {
        self.files.push(PendingFile {
            path: path.into(),
            hash,
            data,
        });
        self
    }

    /// Compress, pack and assemble the archive
    pub fn build(self) -> ArchiveResult<RafArchive> {
        if self.compression_level > 9 {
            return Err(ArchiveError::Config(format!(
                "compression_level must be 0-9, got {}",
                self.compression_level
            )));
        }

        let count = self.files.len() as u64;
        let too_large = |size: u64| ArchiveError::ContentTooLarge {
            size: usize::try_from(size).unwrap_or(usize::MAX),
        };

        let mut files = Vec::with_capacity(self.files.len());
        let mut paths = Vec::with_capacity(self.files.len());
        let mut path_strings = Vec::with_capacity(self.files.len());
        let mut contents = Vec::with_capacity(self.files.len());

        let mut data_offset = 0u64;
        let mut path_offset = 8 + count * PATH_ENTRY_SIZE;

        for (index, pending) in self.files.into_iter().enumerate() {
            let compressed = compress(&pending.data, self.compression_level)?;
            let data_size = compressed.len() as u64;
            let path_length = pending.path.len() as u64 + 1;

            files.push(FileEntry::new(
                pending.hash,
                u32::try_from(data_offset).map_err(|_| too_large(data_offset))?,
                u32::try_from(data_size).map_err(|_| too_large(data_size))?,
                u32::try_from(index).map_err(|_| too_large(index as u64))?,
            ));
            paths.push(PathEntry {
                path_offset: u32::try_from(path_offset).map_err(|_| too_large(path_offset))?,
                path_length: u32::try_from(path_length).map_err(|_| too_large(path_length))?,
            });

            data_offset += data_size;
            path_offset += path_length;
            path_strings.push(pending.path.into_bytes());
            contents.push(compressed);
        }

        let path_list_offset = PREAMBLE_SIZE + 4 + count * FILE_ENTRY_SIZE;
        let header = RafHeader {
            magic: self.magic,
            version: self.version,
            manager_index: self.manager_index,
            file_list_offset: PREAMBLE_SIZE as u32,
            path_list_offset: u32::try_from(path_list_offset)
                .map_err(|_| too_large(path_list_offset))?,
            files,
            path_list_size: u32::try_from(path_offset).map_err(|_| too_large(path_offset))?,
            paths,
            path_strings,
        };

        debug!(
            "Built RAF archive: {} entries, {} data bytes",
            header.files.len(),
            data_offset
        );
        RafArchive::from_parts(header, contents)
    }
}
