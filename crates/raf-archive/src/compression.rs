//! zlib-framed DEFLATE compression for entry payloads

use crate::error::{ArchiveError, ArchiveResult};
use flate2::{Compression, read::ZlibDecoder, write::ZlibEncoder};
use std::io::{Read, Write};

/// Default compression level, matching zlib's default
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// Compress data using zlib compression at the given level (0-9)
pub fn compress(data: &[u8], level: u32) -> ArchiveResult<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(level));
    encoder.write_all(data).map_err(ArchiveError::Compression)?;
    encoder.finish().map_err(ArchiveError::Compression)
}

/// Decompress zlib-compressed data
pub fn decompress(data: &[u8]) -> ArchiveResult<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut decompressed = Vec::new();

    decoder
        .read_to_end(&mut decompressed)
        .map_err(ArchiveError::Compression)?;

    Ok(decompressed)
}
