//! Human-readable archive dumps and payload export

use crate::archive::RafArchive;
use crate::compression::decompress;
use crate::error::{ArchiveError, ArchiveResult};
use std::collections::HashSet;
use std::fmt::{self, Write as _};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

/// Render the header scalars, both tables and the merged file/path view
pub fn describe(archive: &RafArchive) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = write_description(archive, &mut out);
    out
}

fn write_description(archive: &RafArchive, out: &mut String) -> fmt::Result {
    let header = archive.header();

    writeln!(out, "Magic number = {:08x}", header.magic)?;
    writeln!(out, "Version = {}", header.version)?;
    writeln!(out, "Manager index = {}", header.manager_index)?;
    writeln!(out, "File list starts at byte {}", header.file_list_offset)?;
    writeln!(out, "Path list starts at byte {}", header.path_list_offset)?;

    let layout = header.layout();
    if layout.is_consistent() {
        writeln!(out, "Layout consistent")?;
    } else {
        writeln!(
            out,
            "Layout inconsistent: file list at {}, path list at {}, path list size {}",
            layout.actual_file_list_offset,
            layout.actual_path_list_offset,
            layout.actual_path_list_size
        )?;
    }

    writeln!(out, "File list contains {} entries", header.files.len())?;
    for (i, e) in header.files.iter().enumerate() {
        writeln!(
            out,
            "{} hash={:08x} dataOffset={} dataSize={} pathListIndex={}",
            i, e.hash, e.data_offset, e.data_size, e.path_index
        )?;
    }

    writeln!(out, "Path list is {} bytes in size", header.path_list_size)?;
    writeln!(out, "Path list contains {} entries", header.paths.len())?;
    for (i, (e, path)) in header.paths.iter().zip(&header.path_strings).enumerate() {
        writeln!(
            out,
            "{} pathOffset={} pathLength={} string={}",
            i,
            e.path_offset,
            e.path_length,
            String::from_utf8_lossy(path)
        )?;
    }

    writeln!(out, "MERGED VIEW")?;
    for (i, e) in header.files.iter().enumerate() {
        writeln!(
            out,
            "{} dataOffset={} dataSize={} filePath={}",
            i,
            e.data_offset,
            e.data_size,
            header
                .path_bytes_for(e)
                .map_or_else(|| "<missing>".into(), String::from_utf8_lossy)
        )?;
    }

    match archive.check_packing() {
        Ok(()) => writeln!(out, "Data alignment passed")?,
        Err(violation) => writeln!(out, "Data alignment failed: {violation}")?,
    }

    Ok(())
}

impl fmt::Display for RafArchive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&describe(self))
    }
}

/// Decompress every payload into `output_dir`, named by its base name
///
/// Existing files are overwritten. When two entries share a base name the
/// later entry wins. Returns the written paths in entry order.
pub fn dump_decompressed<P: AsRef<Path>>(
    archive: &RafArchive,
    output_dir: P,
) -> ArchiveResult<Vec<PathBuf>> {
    let output_dir = output_dir.as_ref();
    std::fs::create_dir_all(output_dir)?;

    let mut written = Vec::with_capacity(archive.entry_count());
    let mut seen = HashSet::new();

    for index in 0..archive.entry_count() {
        let name = archive.base_name_of(index)?;
        if !is_plain_file_name(name) {
            return Err(ArchiveError::InvalidPath(archive.path_of(index)?.to_string()));
        }

        let data = decompress(archive.content(index)?)?;
        let target = output_dir.join(name);
        if !seen.insert(name) {
            debug!("Entry {} overwrites earlier export {}", index, target.display());
        }

        std::fs::write(&target, &data)?;
        written.push(target);
    }

    info!(
        "Exported {} entries to {}",
        written.len(),
        output_dir.display()
    );
    Ok(written)
}

/// Whether `name` is a single file name that stays inside the output directory
///
/// Backslashes and drive separators are refused on every platform.
fn is_plain_file_name(name: &str) -> bool {
    if name.contains(['\\', ':']) {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

impl RafArchive {
    /// Render the archive structure as text
    pub fn describe(&self) -> String {
        describe(self)
    }

    /// Decompress every payload into `output_dir`
    pub fn dump_decompressed<P: AsRef<Path>>(&self, output_dir: P) -> ArchiveResult<Vec<PathBuf>> {
        dump_decompressed(self, output_dir)
    }
}
