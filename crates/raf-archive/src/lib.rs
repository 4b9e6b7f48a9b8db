//! Parser, inspector and content patcher for RAF archives
//!
#![allow(clippy::cast_possible_truncation)] // Intentional for binary format parsing
#![allow(clippy::cast_lossless)] // Sometimes clearer than From
#![allow(clippy::uninlined_format_args)] // Backwards compatibility
#![allow(clippy::doc_markdown)] // Format field names don't need backticks
#![allow(clippy::module_name_repetitions)] // Clear naming is preferred
#![allow(clippy::similar_names)] // Domain-specific naming patterns
#![allow(clippy::return_self_not_must_use)] // Builder patterns
#![allow(clippy::use_self)] // Type clarity
//! A RAF archive is a pair of files: a header (index) file and a data file.
//! The header lists every stored entry with its opaque hash, its byte range in
//! the data file and a reference into a table of logical paths. The data file
//! is nothing but the zlib-compressed payloads laid out back to back.
//!
//! # Features
//!
//! - **Header codec**: byte-exact decode and encode of the header file
//! - **Data access**: positioned reads and zero-filled write-out of payloads
//! - **Packing check**: verifies payloads form one gapless, non-overlapping run
//! - **Content replacement**: swaps one payload and shifts every later offset
//! - **Diagnostics**: text dump of all tables and export of decompressed payloads
//!
//! # Usage
//!
//! ```rust,no_run
//! use raf_archive::RafArchive;
//!
//! let mut archive = RafArchive::open("Archive_1.raf", "Archive_1.raf.dat")?;
//! archive.check_packing()?;
//!
//! archive.replace_content_from_file("SingleTarget_Colorblind.tga", "Hand1.tga")?;
//! archive.check_packing()?;
//!
//! archive.save("Archive_1.raf.new", "Archive_1.raf.dat.new")?;
//! # Ok::<(), raf_archive::ArchiveError>(())
//! ```
//!
//! Logging goes through `tracing`; verbosity is whatever the caller's
//! subscriber allows.

#![warn(missing_docs)]

pub mod archive;
pub mod builder;
pub mod compression;
pub mod config;
pub mod data;
pub mod diagnostics;
pub mod error;
pub mod header;
pub mod packing;
pub mod patch;
pub mod primitives;

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
pub(crate) mod test_utils;

pub use archive::RafArchive;
pub use builder::RafArchiveBuilder;
pub use config::{ArchiveConfig, TargetMatch};
pub use error::{ArchiveError, ArchiveResult};
pub use header::{FileEntry, HeaderLayout, PathEntry, RAF_MAGIC, RafHeader};
pub use packing::{PackingViolation, PackingViolationKind, check_packing};
pub use patch::{PatchOutcome, reflow_entries};

/// Symmetric parse/build for binary formats
pub trait RafFormat: Sized {
    /// Parse from bytes
    fn parse(data: &[u8]) -> ArchiveResult<Self>;

    /// Build to bytes
    fn build(&self) -> ArchiveResult<Vec<u8>>;

    /// Verify round-trip correctness
    fn verify_round_trip(data: &[u8]) -> ArchiveResult<()> {
        let parsed = Self::parse(data)?;
        let rebuilt = parsed.build()?;
        if data != rebuilt.as_slice() {
            return Err(ArchiveError::malformed(
                format!(
                    "round trip produced {} bytes from {} input bytes",
                    rebuilt.len(),
                    data.len()
                ),
                0,
            ));
        }
        Ok(())
    }
}
