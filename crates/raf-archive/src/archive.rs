//! In-memory RAF archive
//!
//! A [`RafArchive`] owns one decoded header plus the compressed payload of
//! every file entry. The payloads are index-aligned with the file list and
//! stay in memory between reading the data file and writing it back out.

use crate::compression::decompress;
use crate::config::{ArchiveConfig, base_name};
use crate::data::{load_contents, store_contents};
use crate::error::{ArchiveError, ArchiveResult};
use crate::header::{FileEntry, PathEntry, RafHeader};
use crate::packing::{PackingViolation, check_packing};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;
use tracing::{debug, info};

/// Decoded header and data file pair
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RafArchive {
    pub(crate) header: RafHeader,
    pub(crate) contents: Vec<Vec<u8>>,
    pub(crate) config: ArchiveConfig,
}

impl RafArchive {
    /// Create an empty archive with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty archive with the given configuration
    pub fn with_config(config: ArchiveConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Assemble an archive from a header and index-aligned payloads
    pub fn from_parts(header: RafHeader, contents: Vec<Vec<u8>>) -> ArchiveResult<Self> {
        let archive = Self {
            header,
            contents,
            config: ArchiveConfig::default(),
        };
        archive.ensure_contents_loaded()?;
        Ok(archive)
    }

    /// Open a header file and its data file
    pub fn open<P: AsRef<Path>, Q: AsRef<Path>>(
        header_path: P,
        data_path: Q,
    ) -> ArchiveResult<Self> {
        Self::open_with_config(header_path, data_path, ArchiveConfig::default())
    }

    /// Open a header file and its data file with the given configuration
    pub fn open_with_config<P: AsRef<Path>, Q: AsRef<Path>>(
        header_path: P,
        data_path: Q,
        config: ArchiveConfig,
    ) -> ArchiveResult<Self> {
        config.validate()?;
        let header_path = header_path.as_ref();
        let data_path = data_path.as_ref();
        info!("Opening RAF archive {}", header_path.display());

        let mut archive = Self::with_config(config);
        archive.read_header(&mut BufReader::new(File::open(header_path)?))?;
        archive.read_data(BufReader::new(File::open(data_path)?))?;
        Ok(archive)
    }

    /// Write the header and data files
    pub fn save<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        header_path: P,
        data_path: Q,
    ) -> ArchiveResult<()> {
        let header_path = header_path.as_ref();
        let data_path = data_path.as_ref();
        self.ensure_contents_loaded()?;

        let mut header_writer = BufWriter::new(File::create(header_path)?);
        self.write_header(&mut header_writer)?;
        header_writer.flush()?;

        let data_len = self.write_data(BufWriter::new(File::create(data_path)?))?;

        info!(
            "Saved RAF archive {} ({} entries, {} data bytes)",
            header_path.display(),
            self.entry_count(),
            data_len
        );
        Ok(())
    }

    /// Decode the header, dropping any previously loaded payloads
    pub fn read_header<R: Read + Seek>(&mut self, reader: &mut R) -> ArchiveResult<()> {
        self.header = RafHeader::read(reader)?;
        self.contents.clear();
        Ok(())
    }

    /// Load every entry's payload from the data stream
    pub fn read_data<R: Read + Seek>(&mut self, reader: R) -> ArchiveResult<()> {
        self.contents = load_contents(&self.header.files, reader)?;
        Ok(())
    }

    /// Encode the header
    pub fn write_header<W: Write + Seek>(&self, writer: &mut W) -> ArchiveResult<()> {
        self.header.write(writer)
    }

    /// Write the data file image, returning its length
    pub fn write_data<W: Write + Seek>(&self, writer: W) -> ArchiveResult<u64> {
        self.ensure_contents_loaded()?;
        store_contents(&self.header.files, &self.contents, writer)
    }

    /// Check that the payloads are contiguously packed
    pub fn check_packing(&self) -> Result<(), PackingViolation> {
        let result = check_packing(&self.header.files);
        if let Err(violation) = &result {
            debug!("Packing check failed: {}", violation);
        }
        result
    }

    /// Decoded header
    pub fn header(&self) -> &RafHeader {
        &self.header
    }

    /// Active configuration
    pub fn config(&self) -> &ArchiveConfig {
        &self.config
    }

    /// Replace the configuration
    pub fn set_config(&mut self, config: ArchiveConfig) -> ArchiveResult<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// File list in header order
    pub fn files(&self) -> &[FileEntry] {
        &self.header.files
    }

    /// Path list in header order
    pub fn paths(&self) -> &[PathEntry] {
        &self.header.paths
    }

    /// Number of file entries
    pub fn entry_count(&self) -> usize {
        self.header.files.len()
    }

    /// Check whether payloads are loaded for every entry
    pub fn is_loaded(&self) -> bool {
        self.contents.len() == self.header.files.len()
    }

    /// Logical path of an entry
    ///
    /// Paths that are not valid UTF-8 are reported as `InvalidPath`; their raw
    /// bytes stay available through [`RafHeader::path_bytes_for`].
    pub fn path_of(&self, index: usize) -> ArchiveResult<&str> {
        let entry = self.entry(index)?;
        let bytes = self
            .header
            .path_bytes_for(entry)
            .ok_or_else(|| ArchiveError::EntryIndexOutOfRange {
                index: entry.path_index as usize,
                count: self.header.path_strings.len(),
            })?;
        std::str::from_utf8(bytes)
            .map_err(|_| ArchiveError::InvalidPath(String::from_utf8_lossy(bytes).into_owned()))
    }

    /// Last path segment of an entry
    pub fn base_name_of(&self, index: usize) -> ArchiveResult<&str> {
        self.path_of(index).map(base_name)
    }

    /// Compressed payload of an entry
    pub fn content(&self, index: usize) -> ArchiveResult<&[u8]> {
        self.ensure_contents_loaded()?;
        self.entry(index)?;
        Ok(&self.contents[index])
    }

    /// Decompressed payload of an entry
    pub fn decompress_entry(&self, index: usize) -> ArchiveResult<Vec<u8>> {
        decompress(self.content(index)?)
    }

    pub(crate) fn entry(&self, index: usize) -> ArchiveResult<&FileEntry> {
        self.header
            .files
            .get(index)
            .ok_or(ArchiveError::EntryIndexOutOfRange {
                index,
                count: self.header.files.len(),
            })
    }

    pub(crate) fn ensure_contents_loaded(&self) -> ArchiveResult<()> {
        if !self.is_loaded() {
            return Err(ArchiveError::ContentsNotLoaded {
                expected: self.header.files.len(),
                actual: self.contents.len(),
            });
        }
        for (index, (entry, content)) in self.header.files.iter().zip(&self.contents).enumerate() {
            if content.len() != entry.data_size as usize {
                return Err(ArchiveError::ContentSizeMismatch {
                    index,
                    declared: entry.data_size,
                    actual: content.len(),
                });
            }
        }
        Ok(())
    }
}
