#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
//! Integration tests for the load -> patch -> store -> reload cycle
//!
//! Archives are produced by `RafArchiveBuilder`, written to a temporary
//! directory as a header/data file pair and read back through the public API.

use pretty_assertions::assert_eq;
use raf_archive::compression::{compress, decompress};
use raf_archive::{
    ArchiveConfig, ArchiveError, RafArchive, RafArchiveBuilder, RafFormat, RafHeader, TargetMatch,
};
use std::path::{Path, PathBuf};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Payload that compresses to a different size for every seed
fn payload(seed: u8, len: usize) -> Vec<u8> {
    (0..len)
        .map(|i| (i as u8).wrapping_mul(seed).wrapping_add(seed))
        .collect()
}

fn sample_archive() -> RafArchive {
    RafArchiveBuilder::new()
        .add_file("DATA/Menu/HUD/Hand1.tga", 0x0001_0001, payload(3, 4096))
        .add_file("DATA/Menu/HUD/Hand2.tga", 0x0001_0002, payload(5, 2048))
        .add_file("DATA/Menu/HUD/HoverEnemy.tga", 0x0001_0003, payload(7, 1024))
        .add_file("DATA/Menu/HUD/HoverFriendly.tga", 0x0001_0004, payload(11, 512))
        .build()
        .expect("Operation should succeed")
}

fn pair(dir: &Path, name: &str) -> (PathBuf, PathBuf) {
    (
        dir.join(format!("{name}.raf")),
        dir.join(format!("{name}.raf.dat")),
    )
}

#[test]
fn header_file_round_trips_byte_for_byte() {
    init_tracing();
    let dir = tempfile::tempdir().expect("Operation should succeed");
    let (header_path, data_path) = pair(dir.path(), "Archive_1");

    sample_archive()
        .save(&header_path, &data_path)
        .expect("Operation should succeed");

    let original = std::fs::read(&header_path).expect("Operation should succeed");
    RafHeader::verify_round_trip(&original).expect("Operation should succeed");

    let archive = RafArchive::open(&header_path, &data_path).expect("Operation should succeed");
    let (copy_header, copy_data) = pair(dir.path(), "copy");
    archive
        .save(&copy_header, &copy_data)
        .expect("Operation should succeed");

    assert_eq!(
        std::fs::read(&copy_header).expect("Operation should succeed"),
        original
    );
    assert_eq!(
        std::fs::read(&copy_data).expect("Operation should succeed"),
        std::fs::read(&data_path).expect("Operation should succeed")
    );
}

#[test]
fn freshly_loaded_archive_is_packed() {
    let dir = tempfile::tempdir().expect("Operation should succeed");
    let (header_path, data_path) = pair(dir.path(), "Archive_2");
    sample_archive()
        .save(&header_path, &data_path)
        .expect("Operation should succeed");

    let archive = RafArchive::open(&header_path, &data_path).expect("Operation should succeed");
    assert!(archive.check_packing().is_ok());
    assert!(archive.header().layout().is_consistent());
    assert_eq!(archive.entry_count(), 4);
}

#[test]
fn untouched_entries_survive_patch_cycle() {
    init_tracing();
    let dir = tempfile::tempdir().expect("Operation should succeed");
    let (header_path, data_path) = pair(dir.path(), "Archive_3");
    sample_archive()
        .save(&header_path, &data_path)
        .expect("Operation should succeed");

    let mut archive = RafArchive::open(&header_path, &data_path).expect("Operation should succeed");
    let before: Vec<Vec<u8>> = (0..archive.entry_count())
        .map(|i| archive.decompress_entry(i).expect("Operation should succeed"))
        .collect();
    let offsets_before: Vec<u32> = archive.files().iter().map(|f| f.data_offset).collect();

    let replacement = dir.path().join("SingleTarget_Colorblind.tga");
    let new_raw = payload(13, 10_000);
    std::fs::write(&replacement, &new_raw).expect("Operation should succeed");

    let outcome = archive
        .replace_content_from_file(&replacement, "Hand2.tga")
        .expect("Operation should succeed");
    assert_eq!(outcome.index, 1);
    assert_eq!(
        outcome.new_size as usize,
        compress(&new_raw, 6).expect("Operation should succeed").len()
    );
    assert!(archive.check_packing().is_ok());

    // Offsets after the target move by exactly the size delta
    for (i, file) in archive.files().iter().enumerate() {
        let expected = if offsets_before[i] > outcome.target_offset {
            (i64::from(offsets_before[i]) + outcome.delta) as u32
        } else {
            offsets_before[i]
        };
        assert_eq!(file.data_offset, expected, "entry {i}");
    }

    let (new_header, new_data) = pair(dir.path(), "Archive_3.new");
    archive
        .save(&new_header, &new_data)
        .expect("Operation should succeed");

    let reloaded = RafArchive::open(&new_header, &new_data).expect("Operation should succeed");
    assert!(reloaded.check_packing().is_ok());
    assert_eq!(
        reloaded.decompress_entry(1).expect("Operation should succeed"),
        new_raw
    );
    for i in [0, 2, 3] {
        assert_eq!(
            reloaded.decompress_entry(i).expect("Operation should succeed"),
            before[i],
            "entry {i}"
        );
    }
    assert_eq!(
        std::fs::metadata(&new_data)
            .expect("Operation should succeed")
            .len(),
        reloaded.files().iter().map(|f| u64::from(f.data_size)).sum::<u64>()
    );
}

#[test]
fn target_resolution_errors() {
    let mut archive = RafArchiveBuilder::new()
        .add_file("DATA/A/Shared.dds", 1, b"a".to_vec())
        .add_file("DATA/B/Shared.dds", 2, b"b".to_vec())
        .add_file("DATA/B/Unique.dds", 3, b"c".to_vec())
        .build()
        .expect("Operation should succeed");
    let before = archive.clone();

    match archive.replace_content("Shared.dds", b"new") {
        Err(ArchiveError::AmbiguousTarget { matches, .. }) => assert_eq!(matches, vec![0, 1]),
        other => panic!("Expected ambiguous target, got {other:?}"),
    }
    match archive.replace_content("Missing.dds", b"new") {
        Err(err @ ArchiveError::TargetNotFound { .. }) => assert!(err.is_target_error()),
        other => panic!("Expected missing target, got {other:?}"),
    }
    assert_eq!(archive, before);

    archive
        .set_config(ArchiveConfig::new().with_target_match(TargetMatch::FullPath))
        .expect("Operation should succeed");
    let outcome = archive
        .replace_content("DATA/B/Shared.dds", b"replacement")
        .expect("Operation should succeed");
    assert_eq!(outcome.index, 1);
    assert_eq!(
        decompress(archive.content(1).expect("Operation should succeed"))
            .expect("Operation should succeed"),
        b"replacement"
    );
}

#[test]
fn export_writes_decompressed_payloads() {
    let archive = sample_archive();
    let dir = tempfile::tempdir().expect("Operation should succeed");
    let out = dir.path().join("output");

    let written = archive
        .dump_decompressed(&out)
        .expect("Operation should succeed");
    assert_eq!(written.len(), 4);
    assert_eq!(
        std::fs::read(out.join("HoverEnemy.tga")).expect("Operation should succeed"),
        payload(7, 1024)
    );
}

#[test]
fn truncated_header_file_is_malformed() {
    let dir = tempfile::tempdir().expect("Operation should succeed");
    let (header_path, data_path) = pair(dir.path(), "Archive_4");
    sample_archive()
        .save(&header_path, &data_path)
        .expect("Operation should succeed");

    let bytes = std::fs::read(&header_path).expect("Operation should succeed");
    std::fs::write(&header_path, &bytes[..bytes.len() / 2]).expect("Operation should succeed");

    let err = RafArchive::open(&header_path, &data_path).expect_err("Truncated header");
    assert!(err.is_malformed(), "{err}");
}

#[test]
fn short_data_file_is_out_of_bounds() {
    let dir = tempfile::tempdir().expect("Operation should succeed");
    let (header_path, data_path) = pair(dir.path(), "Archive_5");
    sample_archive()
        .save(&header_path, &data_path)
        .expect("Operation should succeed");

    let bytes = std::fs::read(&data_path).expect("Operation should succeed");
    std::fs::write(&data_path, &bytes[..bytes.len() - 1]).expect("Operation should succeed");

    let err = RafArchive::open(&header_path, &data_path).expect_err("Short data file");
    assert!(matches!(err, ArchiveError::EntryOutOfBounds { index: 3, .. }));
}
