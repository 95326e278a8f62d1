use crate::backup::archive::{ArchiveEntry, ArchiveEntryIterable};
use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::result_error::WithMsg;
use crate::backup::validate::validate_dir_exist;

use bon::Builder;
use getset::Getters;
use validator::Validate;
use walkdir::{DirEntry, WalkDir};

use std::path::{Path, PathBuf};

/// Configuration for backing up one directory tree
///
/// Recursively walks a source directory and includes every regular file,
/// preserving the directory structure under `dst_dir` in the archive.
#[derive(Clone, Debug, Validate, Builder, PartialEq, Eq, Getters)]
#[getset(get = "pub")]
pub struct DirTreeSource {
    #[validate(custom(function = validate_dir_exist))]
    #[builder(into)]
    src_dir: PathBuf,
    #[builder(default, into)]
    dst_dir: PathBuf,
}

impl ArchiveEntryIterable for DirTreeSource {
    fn archive_entry_iterator(
        &self,
    ) -> Result<Box<dyn Iterator<Item = Result<ArchiveEntry>> + Send>> {
        if !self.src_dir.is_dir() {
            tracing::error!(
                "Source directory does not exist or is not a directory: {:?}",
                self.src_dir
            );
            return Err(Error::from(std::io::Error::other(
                "src_dir is not a directory",
            )));
        }

        tracing::info!("Starting directory scan: {:?}", self.src_dir);

        let src_dir = self.src_dir.to_path_buf();
        let dst_dir = self.dst_dir.to_path_buf();

        let entries = WalkDir::new(&self.src_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(move |res| match res {
                Ok(de) => process_dir_entry(de, &src_dir, &dst_dir),
                Err(e) => Some(Err(e.into())),
            });

        Ok(Box::new(entries))
    }
}

fn process_dir_entry<P1: AsRef<Path>, P2: AsRef<Path>>(
    de: DirEntry,
    base_src_dir: P1,
    base_dst_dir: P2,
) -> Option<Result<ArchiveEntry>> {
    let p = de.into_path();
    if !p.is_file() {
        tracing::trace!("Skipping {:?} not a file", p);
        return None;
    }

    let res = match p.strip_prefix(base_src_dir.as_ref()) {
        Ok(stripped_path) => Ok(base_dst_dir.as_ref().join(stripped_path)),
        Err(e) => Err(Error::from(e).with_msg(format!(
            "Stripping {:?} from {:?} failed",
            base_src_dir.as_ref(),
            p
        ))),
    };

    Some(res.map(|dst| {
        let entry = ArchiveEntry::new(p, dst);
        tracing::trace!("Including file: {:?} -> {:?}", entry.src, entry.dst);
        entry
    }))
}
