//! Contiguous packing check for data file entries
//!
//! Sorted by data offset, every payload must end exactly where the next one
//! begins. The first payload does not have to start at zero.

use crate::header::FileEntry;
use std::fmt;
use thiserror::Error;

/// How two neighbouring payloads fail to meet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackingViolationKind {
    /// Unused bytes between the payloads
    Gap,
    /// The payloads share bytes
    Overlap,
}

impl fmt::Display for PackingViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gap => write!(f, "gap"),
            Self::Overlap => write!(f, "overlap"),
        }
    }
}

/// First pair of neighbouring entries that are not contiguous
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error(
    "{kind} between entry {previous_index} (ends at {previous_end}) and entry {next_index} (starts at {next_offset})"
)]
pub struct PackingViolation {
    /// Gap or overlap
    pub kind: PackingViolationKind,
    /// Index of the entry with the lower offset
    pub previous_index: usize,
    /// `data_offset + data_size` of that entry
    pub previous_end: u64,
    /// Index of the following entry
    pub next_index: usize,
    /// `data_offset` of the following entry
    pub next_offset: u64,
}

/// Check that the entries form one contiguous run when ordered by offset
///
/// Entries that share an offset keep their header order.
pub fn check_packing(files: &[FileEntry]) -> Result<(), PackingViolation> {
    let mut order: Vec<usize> = (0..files.len()).collect();
    order.sort_by_key(|&i| files[i].data_offset);

    for pair in order.windows(2) {
        let (previous, next) = (&files[pair[0]], &files[pair[1]]);
        let previous_end = previous.data_end();
        let next_offset = u64::from(next.data_offset);

        if previous_end != next_offset {
            return Err(PackingViolation {
                kind: if previous_end < next_offset {
                    PackingViolationKind::Gap
                } else {
                    PackingViolationKind::Overlap
                },
                previous_index: pair[0],
                previous_end,
                next_index: pair[1],
                next_offset,
            });
        }
    }

    Ok(())
}

/// End of the furthest payload, i.e. the size a packed data file needs
pub fn packed_extent(files: &[FileEntry]) -> u64 {
    files.iter().map(FileEntry::data_end).max().unwrap_or(0)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    fn entries(layout: &[(u32, u32)]) -> Vec<FileEntry> {
        layout
            .iter()
            .enumerate()
            .map(|(i, &(offset, size))| FileEntry::new(i as u32, offset, size, 0))
            .collect()
    }

    #[test]
    fn test_contiguous_passes() {
        assert!(check_packing(&entries(&[(0, 100), (100, 150), (250, 50)])).is_ok());
        // Header order does not matter
        assert!(check_packing(&entries(&[(250, 50), (0, 100), (100, 150)])).is_ok());
        // First payload may start late
        assert!(check_packing(&entries(&[(16, 4), (20, 4)])).is_ok());
    }

    #[test]
    fn test_trivial_archives_pass() {
        assert!(check_packing(&[]).is_ok());
        assert!(check_packing(&entries(&[(12, 7)])).is_ok());
    }

    #[test]
    fn test_gap_detected() {
        let violation = check_packing(&entries(&[(0, 100), (110, 10)])).expect_err("Gap");
        assert_eq!(violation.kind, PackingViolationKind::Gap);
        assert_eq!(violation.previous_index, 0);
        assert_eq!(violation.previous_end, 100);
        assert_eq!(violation.next_index, 1);
        assert_eq!(violation.next_offset, 110);
    }

    #[test]
    fn test_overlap_detected() {
        let violation = check_packing(&entries(&[(90, 10), (0, 100)])).expect_err("Overlap");
        assert_eq!(violation.kind, PackingViolationKind::Overlap);
        assert_eq!(violation.previous_index, 1);
        assert_eq!(violation.next_index, 0);
        assert!(violation.to_string().starts_with("overlap"));
    }

    #[test]
    fn test_packed_extent() {
        assert_eq!(packed_extent(&entries(&[(100, 150), (0, 100)])), 250);
        assert_eq!(packed_extent(&[]), 0);
    }
}
