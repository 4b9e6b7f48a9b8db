//! Content replacement
//!
//! Replacing a payload changes its compressed size, so every payload stored
//! after it in the data file has to move by the same amount. The new file list
//! is computed first by [`reflow_entries`] and only committed once every check
//! has passed, so a failed replacement leaves the archive untouched.

use crate::archive::RafArchive;
use crate::compression::compress;
use crate::error::{ArchiveError, ArchiveResult};
use crate::header::FileEntry;
use crate::packing::check_packing;
use std::path::Path;
use tracing::{debug, info, trace};

/// Summary of a committed replacement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchOutcome {
    /// Index of the replaced entry
    pub index: usize,
    /// Data offset of the replaced entry (unchanged by the replacement)
    pub target_offset: u32,
    /// Compressed size before the replacement
    pub old_size: u32,
    /// Compressed size after the replacement
    pub new_size: u32,
    /// Shift applied to every entry stored after the target
    pub delta: i64,
    /// Number of entries whose offset moved
    pub shifted: usize,
}

/// Resize one entry and shift every entry stored after it
///
/// Entries whose offset is strictly greater than the target's offset move by
/// `new_size - old_size`. The target keeps its offset. Everything else is
/// returned unchanged.
pub fn reflow_entries(
    files: &[FileEntry],
    target: usize,
    new_size: u32,
) -> ArchiveResult<Vec<FileEntry>> {
    let target_entry = files.get(target).ok_or(ArchiveError::EntryIndexOutOfRange {
        index: target,
        count: files.len(),
    })?;
    let target_offset = target_entry.data_offset;
    let delta = i64::from(new_size) - i64::from(target_entry.data_size);

    files
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let mut entry = *entry;
            if index == target {
                entry.data_size = new_size;
            } else if entry.data_offset > target_offset {
                let shifted = i64::from(entry.data_offset) + delta;
                entry.data_offset =
                    u32::try_from(shifted).map_err(|_| ArchiveError::OffsetOverflow {
                        index,
                        offset: entry.data_offset,
                        delta,
                    })?;
            }
            Ok(entry)
        })
        .collect()
}

impl RafArchive {
    /// Indices of every entry whose path matches `target` under the configured mode
    pub fn find_entries(&self, target: &str) -> Vec<usize> {
        let mode = self.config.target_match;
        self.header
            .files
            .iter()
            .enumerate()
            .filter(|(_, file)| {
                self.header
                    .path_for(file)
                    .is_some_and(|path| mode.matches(path, target))
            })
            .map(|(index, _)| index)
            .collect()
    }

    /// Resolve a replacement target to exactly one entry
    pub fn resolve_target(&self, target: &str) -> ArchiveResult<usize> {
        let matches = self.find_entries(target);
        match matches.as_slice() {
            [] => Err(ArchiveError::TargetNotFound {
                target: target.to_string(),
            }),
            [index] => Ok(*index),
            _ => Err(ArchiveError::AmbiguousTarget {
                target: target.to_string(),
                matches,
            }),
        }
    }

    /// Compress `raw` and store it as the payload of the entry matching `target`
    pub fn replace_content(&mut self, target: &str, raw: &[u8]) -> ArchiveResult<PatchOutcome> {
        self.ensure_contents_loaded()?;
        let index = self.resolve_target(target)?;
        debug!("Replacing {} (entry {}) with {} raw bytes", target, index, raw.len());

        let compressed = compress(raw, self.config.compression_level)?;
        self.replace_compressed(index, compressed)
    }

    /// Read a replacement file from disk and store it under `target`
    pub fn replace_content_from_file<P: AsRef<Path>>(
        &mut self,
        source: P,
        target: &str,
    ) -> ArchiveResult<PatchOutcome> {
        let source = source.as_ref();
        info!("Replacing {} with {}", target, source.display());
        let raw = std::fs::read(source)?;
        self.replace_content(target, &raw)
    }

    /// Store an already compressed payload for the entry at `index`
    pub fn replace_compressed(
        &mut self,
        index: usize,
        compressed: Vec<u8>,
    ) -> ArchiveResult<PatchOutcome> {
        self.ensure_contents_loaded()?;
        let old = *self.entry(index)?;
        let new_size =
            u32::try_from(compressed.len()).map_err(|_| ArchiveError::ContentTooLarge {
                size: compressed.len(),
            })?;

        let files = reflow_entries(&self.header.files, index, new_size)?;

        if self.config.verify_packing {
            check_packing(&self.header.files)?;
            check_packing(&files)?;
        }

        let shifted = self
            .header
            .files
            .iter()
            .zip(&files)
            .filter(|(before, after)| before.data_offset != after.data_offset)
            .count();

        let outcome = PatchOutcome {
            index,
            target_offset: old.data_offset,
            old_size: old.data_size,
            new_size,
            delta: i64::from(new_size) - i64::from(old.data_size),
            shifted,
        };
        trace!("Reflowed file list: {:?}", files);

        self.header.files = files;
        self.contents[index] = compressed;

        debug!(
            "Entry {} resized {} -> {} bytes, shifted {} entries after offset {} by {}",
            index,
            outcome.old_size,
            outcome.new_size,
            outcome.shifted,
            outcome.target_offset,
            outcome.delta
        );
        Ok(outcome)
    }
}
