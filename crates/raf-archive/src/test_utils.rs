//! Test utilities shared by the unit test modules
//!
//! The sample header is laid out the way a conforming writer produces it:
//! three entries at offsets `[0, 100, 250]` with sizes `[100, 150, 50]`.

use crate::RafFormat;
use crate::header::{FileEntry, PathEntry, RAF_MAGIC, RafHeader};
use crate::primitives::encode_u32_le;
use std::fmt::Debug;

/// Paths used by the sample header
pub const SAMPLE_PATHS: [&str; 3] = [
    "DATA/Menu/Hand1.tga",
    "DATA/Menu/Hand2.tga",
    "DATA/Characters/Annie/Annie.skn",
];

/// Sample header as a struct
pub fn sample_header() -> RafHeader {
    let files = vec![
        FileEntry::new(0x1111, 0, 100, 0),
        FileEntry::new(0x2222, 100, 150, 1),
        FileEntry::new(0x3333, 250, 50, 2),
    ];

    let strings_start = 8 + 8 * SAMPLE_PATHS.len() as u32;
    let mut offset = strings_start;
    let mut paths = Vec::new();
    for path in SAMPLE_PATHS {
        let length = path.len() as u32 + 1;
        paths.push(PathEntry {
            path_offset: offset,
            path_length: length,
        });
        offset += length;
    }

    RafHeader {
        magic: RAF_MAGIC,
        version: 1,
        manager_index: 0,
        file_list_offset: 20,
        path_list_offset: 20 + 4 + 16 * files.len() as u32,
        files,
        path_list_size: offset,
        paths,
        path_strings: SAMPLE_PATHS.iter().map(|s| s.as_bytes().to_vec()).collect(),
    }
}

/// Sample header encoded field by field, without going through the codec
pub fn sample_header_bytes() -> Vec<u8> {
    let header = sample_header();
    let mut data = Vec::new();
    let mut put = |value: u32| data.extend_from_slice(&encode_u32_le(value));

    put(header.magic);
    put(header.version);
    put(header.manager_index);
    put(header.file_list_offset);
    put(header.path_list_offset);

    put(header.files.len() as u32);
    for file in &header.files {
        put(file.hash);
        put(file.data_offset);
        put(file.data_size);
        put(file.path_index);
    }

    put(header.path_list_size);
    put(header.paths.len() as u32);
    for path in &header.paths {
        put(path.path_offset);
        put(path.path_length);
    }

    for path in &header.path_strings {
        data.extend_from_slice(path);
        data.push(0);
    }
    data
}

/// Test round-trip serialization for a format instance
///
/// Verifies that a format can be serialized and deserialized back
/// to an equivalent value.
pub fn test_round_trip<T>(original: &T) -> Result<(), Box<dyn std::error::Error>>
where
    T: RafFormat + PartialEq + Debug,
{
    let data = original.build()?;
    let parsed = T::parse(&data)?;

    if original != &parsed {
        return Err(format!(
            "Round-trip verification failed:\nOriginal: {:?}\nParsed: {:?}",
            original, parsed
        )
        .into());
    }

    Ok(())
}
