pub mod dir_tree;

use crate::backup::result_error::result::Result;
use std::path::Path;
use std::sync::Arc;

/// Represents a single file to be included in a backup archive
///
/// Contains the source path on the filesystem and the destination path
/// the file is stored under inside the archive.
#[derive(Debug)]
pub struct ArchiveEntry {
    /// Source file path on the filesystem
    pub src: Arc<Path>,

    /// Destination path within the backup archive
    ///
    /// This determines the internal structure of the archive; extracting
    /// it recreates the source layout relative to the backup root.
    pub dst: Arc<Path>,
}

impl ArchiveEntry {
    /// Creates a new archive entry
    pub fn new<A: Into<Arc<Path>>, B: Into<Arc<Path>>>(src: A, dst: B) -> ArchiveEntry {
        Self {
            src: src.into(),
            dst: dst.into(),
        }
    }
}

/// Trait for generating archive entries from a backup source
///
/// Each source scans its configured location and yields `ArchiveEntry`
/// objects representing the files to back up.
pub trait ArchiveEntryIterable {
    /// Returns an iterator of archive entries to be included in the backup
    ///
    /// The iterator yields `Result`s so errors during the scan
    /// (permission denied, vanished files) surface per entry.
    fn archive_entry_iterator(
        &self,
    ) -> Result<Box<dyn Iterator<Item = Result<ArchiveEntry>> + Send>>;
}
