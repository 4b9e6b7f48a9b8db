//! Error types for RAF archive operations

use crate::packing::PackingViolation;
use thiserror::Error;

/// Archive operation result type
pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// Error types for RAF archive operations
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Header file is truncated or its declared counts/lengths are inconsistent
    #[error("Malformed header at byte {position}: {reason}")]
    MalformedHeader {
        /// Description of the inconsistency
        reason: String,
        /// Stream position where decoding failed
        position: u64,
    },

    /// Entries are not contiguously packed
    #[error("Packing violation: {0}")]
    Packing(#[from] PackingViolation),

    /// No entry matches the replacement target
    #[error("Replacement target not found: {target}")]
    TargetNotFound {
        /// Requested target name
        target: String,
    },

    /// More than one entry matches the replacement target
    #[error("Replacement target {target} is ambiguous: matches entries {matches:?}")]
    AmbiguousTarget {
        /// Requested target name
        target: String,
        /// Indices of every matching entry
        matches: Vec<usize>,
    },

    /// DEFLATE codec failure
    #[error("Compression error: {0}")]
    Compression(#[source] std::io::Error),

    /// Entry extends past the end of the data stream
    #[error(
        "Entry {index} out of bounds: offset {offset} + size {size} exceeds data length {data_len}"
    )]
    EntryOutOfBounds {
        /// Entry index
        index: usize,
        /// Declared data offset
        offset: u32,
        /// Declared data size
        size: u32,
        /// Total length of the data stream
        data_len: u64,
    },

    /// Content bytes were not loaded for every entry
    #[error("Contents not loaded: expected {expected} entries, have {actual}")]
    ContentsNotLoaded {
        /// Number of file entries
        expected: usize,
        /// Number of loaded content blobs
        actual: usize,
    },

    /// Loaded payload length disagrees with the entry's data size
    #[error("Entry {index} declares {declared} bytes but its content has {actual}")]
    ContentSizeMismatch {
        /// Entry index
        index: usize,
        /// Declared data size
        declared: u32,
        /// Length of the content held in memory
        actual: usize,
    },

    /// Entry index outside the file list
    #[error("Entry index {index} out of range (archive has {count} entries)")]
    EntryIndexOutOfRange {
        /// Requested index
        index: usize,
        /// Number of entries
        count: usize,
    },

    /// Shifting an entry's offset would leave the u32 range
    #[error("Offset overflow for entry {index}: offset {offset} shifted by {delta}")]
    OffsetOverflow {
        /// Entry index
        index: usize,
        /// Offset before the shift
        offset: u32,
        /// Signed shift
        delta: i64,
    },

    /// Compressed replacement does not fit in a u32 size field
    #[error("Content too large: {size} bytes")]
    ContentTooLarge {
        /// Compressed size in bytes
        size: usize,
    },

    /// Path cannot be used as an output file name
    #[error("Invalid path for export: {0:?}")]
    InvalidPath(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Configuration file could not be parsed
    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// Binary write error
    #[error("Binary format error: {0}")]
    BinaryFormat(#[from] binrw::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ArchiveError {
    /// Build a malformed header error
    pub fn malformed(reason: impl Into<String>, position: u64) -> Self {
        Self::MalformedHeader {
            reason: reason.into(),
            position,
        }
    }

    /// Convert a binrw error raised while decoding a header section
    ///
    /// Short reads mean the header is truncated, so they become
    /// `MalformedHeader`. Other I/O failures stay `Io`.
    pub(crate) fn from_binrw(section: &str, position: u64, err: binrw::Error) -> Self {
        match err {
            binrw::Error::Io(io) if io.kind() == std::io::ErrorKind::UnexpectedEof => {
                Self::malformed(format!("{section}: unexpected end of header"), position)
            }
            binrw::Error::Io(io) => Self::Io(io),
            other => {
                let position = match &other {
                    binrw::Error::AssertFail { pos, .. }
                    | binrw::Error::BadMagic { pos, .. }
                    | binrw::Error::Custom { pos, .. } => *pos,
                    _ => position,
                };
                Self::malformed(format!("{section}: {other}"), position)
            }
        }
    }

    /// Check if this error means the header could not be decoded
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedHeader { .. })
    }

    /// Check if this error came from replacement target resolution
    pub fn is_target_error(&self) -> bool {
        matches!(
            self,
            Self::TargetNotFound { .. } | Self::AmbiguousTarget { .. }
        )
    }

    /// Check if this is a validation error
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Self::Packing(_)
                | Self::OffsetOverflow { .. }
                | Self::ContentTooLarge { .. }
                | Self::EntryOutOfBounds { .. }
                | Self::ContentSizeMismatch { .. }
        )
    }
}
