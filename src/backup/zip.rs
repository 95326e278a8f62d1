use crate::backup::archive::ArchiveEntry;
use crate::backup::result_error::result::Result;
use std::fs::File;
use std::io::{Seek, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Writes archive entries into a zip container
///
/// Drains `entries` into a deflate-compressed zip written through `writer`
/// and returns the inner writer once the central directory is finished.
pub fn write_zip_archive<W, I>(writer: W, entries: I) -> Result<W>
where
    W: Write + Seek,
    I: IntoIterator<Item = Result<ArchiveEntry>>,
{
    let mut zip = ZipWriter::new(writer);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut entry_count = 0;
    for entry in entries {
        let entry = entry?;
        zip.start_file_from_path(entry.dst.as_ref(), options)?;
        let mut src = File::open(entry.src.as_ref())?;
        std::io::copy(&mut src, &mut zip)?;
        entry_count += 1;
    }
    tracing::info!("Processed {} archive entries", entry_count);

    Ok(zip.finish()?)
}
