use crate::backup::archive::dir_tree::DirTreeSource;
use crate::backup::archive::ArchiveEntryIterable;
use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::result_error::WithMsg;
use crate::backup::validate::validate_writable_dir;
use crate::backup::zip::write_zip_archive;
use chrono::{DateTime, Local, TimeZone};
use std::fmt::Display;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use validator::Validate;

/// Relative source directories archived from the root, in archive order
static SOURCE_DIRS: [&str; 2] = ["data", "OppWorks_Procurement"];
static OUT_DIR_NAME: &str = "backups";
static ARCHIVE_BASE_NAME: &str = "oppworks_backup";
static TIME_FORMAT: &str = "%Y%m%d_%H%M%S";
static ZIP_FILE_EXT: &str = "zip";

/// Resolved plan for one backup run
#[derive(Clone, Debug, Validate)]
pub struct BackupConfig {
    pub archive_base_name: Arc<str>,
    #[validate(custom(function = validate_writable_dir))]
    pub out_dir: Arc<Path>,
    #[validate(nested)]
    pub sources: Vec<DirTreeSource>,
}

impl BackupConfig {
    /// Builds the fixed backup plan for a root directory
    ///
    /// Sources are the `data` and `OppWorks_Procurement` trees directly
    /// under `root`; the archive lands in `<root>/backups`. Each source
    /// keeps its directory name as the prefix inside the archive, so
    /// extraction reproduces the root layout.
    pub fn for_root<P: AsRef<Path>>(root: P) -> BackupConfig {
        let root = root.as_ref();
        let sources = SOURCE_DIRS
            .into_iter()
            .map(|dir| {
                DirTreeSource::builder()
                    .src_dir(root.join(dir))
                    .dst_dir(dir)
                    .build()
            })
            .collect();

        BackupConfig {
            archive_base_name: ARCHIVE_BASE_NAME.into(),
            out_dir: root.join(OUT_DIR_NAME).into(),
            sources,
        }
    }

    fn time_file_name<O: Display, T: TimeZone<Offset = O>>(&self, dt: DateTime<T>) -> String {
        format!(
            "{}_{}.{}",
            self.archive_base_name,
            dt.format(TIME_FORMAT),
            ZIP_FILE_EXT
        )
    }

    /// Writes one archive for the given timestamp
    ///
    /// The archive is staged as `<name>.tmp` next to the final file and
    /// renamed into place once the central directory is finished; a
    /// failed run removes the staged file.
    pub fn create_archive<O: Display, T: TimeZone<Offset = O>>(
        &self,
        dt: DateTime<T>,
    ) -> Result<PathBuf> {
        let file_name = self.time_file_name(dt);
        let file_path_tmp = self.out_dir.join(format!("{file_name}.tmp"));

        let archive_res = File::create_new(&file_path_tmp)
            .map(BufWriter::new)
            .map_err(Error::from)
            .and_then(|writer| {
                let entry_iters = self
                    .sources
                    .iter()
                    .map(|source| source.archive_entry_iterator())
                    .collect::<Result<Vec<_>>>()?;
                write_zip_archive(writer, entry_iters.into_iter().flatten())
            });

        match archive_res {
            Ok(_) => {
                let file_path = self.out_dir.join(&file_name);
                std::fs::rename(&file_path_tmp, &file_path)
                    .map(|_| file_path)
                    .map_err(Error::from)
                    .with_msg("Persisting finished archive failed")
            }
            Err(e) => {
                if let Err(e2) = std::fs::remove_file(&file_path_tmp) {
                    if e2.kind() != std::io::ErrorKind::NotFound {
                        warn!("Removing staged file {:?} failed: {}", file_path_tmp, e2);
                    }
                }
                Err(e.with_msg(format!("Creating archive {file_name} failed")))
            }
        }
    }
}

/// Runs one complete backup of `root`
///
/// Resolves the root, pre-checks the source directories and the output
/// directory (creating `<root>/backups` if absent) and writes a
/// timestamped archive of both source trees. Returns the absolute path
/// of the new archive.
pub fn run_backup<P: AsRef<Path>>(root: P) -> Result<PathBuf> {
    let root = std::fs::canonicalize(root.as_ref())
        .map_err(Error::from)
        .with_msg(format!("Resolving root {:?} failed", root.as_ref()))?;

    let config = BackupConfig::for_root(&root);
    config
        .validate()
        .map_err(Error::from)
        .with_msg("Backup pre-checks failed")?;

    info!("Backing up {:?} under {:?}", SOURCE_DIRS, root);
    let archive_path = config.create_archive(Local::now())?;
    info!("Created backup file: {:?}", &archive_path);
    Ok(archive_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::io::Read;
    use std::path::Path;
    use tempfile::TempDir;

    fn create_root() -> TempDir {
        let root = TempDir::new().unwrap();
        create_source_trees(root.path());
        root
    }

    fn create_source_trees(root: &Path) {
        std::fs::create_dir_all(root.join("data")).unwrap();
        std::fs::write(root.join("data/procurement.db"), "db bytes").unwrap();
        std::fs::write(root.join("data/config.json"), "{}").unwrap();

        let project = root.join("OppWorks_Procurement/Widget Rollout");
        for sub in ["Quote", "Order", "Delivery", "Invoice"] {
            std::fs::create_dir_all(project.join(sub)).unwrap();
        }
        std::fs::write(project.join("Quote/supplier_quote.pdf"), "%PDF-1.4").unwrap();
    }

    fn assert_archive_name(name: &str) {
        let rest = name.strip_prefix("oppworks_backup_").unwrap();
        let rest = rest.strip_suffix(".zip").unwrap();
        let (date, time) = rest.split_once('_').unwrap();
        assert_eq!(date.len(), 8);
        assert_eq!(time.len(), 6);
        assert!(date.chars().all(|c| c.is_ascii_digit()));
        assert!(time.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_for_root_layout() {
        let config = BackupConfig::for_root("/srv/oppworks");

        assert_eq!(config.archive_base_name.as_ref(), "oppworks_backup");
        assert_eq!(config.out_dir.as_ref(), Path::new("/srv/oppworks/backups"));
        assert_eq!(config.sources.len(), 2);
        assert_eq!(
            config.sources[0].src_dir(),
            Path::new("/srv/oppworks/data")
        );
        assert_eq!(config.sources[0].dst_dir(), Path::new("data"));
        assert_eq!(
            config.sources[1].src_dir(),
            Path::new("/srv/oppworks/OppWorks_Procurement")
        );
        assert_eq!(
            config.sources[1].dst_dir(),
            Path::new("OppWorks_Procurement")
        );
    }

    #[test]
    fn test_time_file_name_format() {
        let config = BackupConfig::for_root("/srv/oppworks");
        let dt = Utc.with_ymd_and_hms(2024, 1, 31, 13, 5, 9).unwrap();

        let name = config.time_file_name(dt);
        assert_eq!(name, "oppworks_backup_20240131_130509.zip");
        assert_archive_name(&name);
    }

    #[test]
    fn test_validate_creates_out_dir() {
        let root = create_root();
        let config = BackupConfig::for_root(root.path());

        assert!(!root.path().join("backups").exists());
        config.validate().unwrap();
        assert!(root.path().join("backups").is_dir());

        // Idempotent when the directory already exists
        config.validate().unwrap();
        assert!(root.path().join("backups").is_dir());
    }

    #[test]
    fn test_validate_rejects_missing_data_dir() {
        let root = TempDir::new().unwrap();
        std::fs::create_dir_all(root.path().join("OppWorks_Procurement")).unwrap();

        let config = BackupConfig::for_root(root.path());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_create_archive_round_trips_sources() {
        let root = create_root();
        let config = BackupConfig::for_root(root.path());
        config.validate().unwrap();

        let dt = Utc.with_ymd_and_hms(2024, 1, 31, 13, 5, 9).unwrap();
        let archive_path = config.create_archive(dt).unwrap();

        assert!(archive_path.is_file());
        assert_archive_name(archive_path.file_name().unwrap().to_str().unwrap());

        let mut archive = zip::ZipArchive::new(File::open(&archive_path).unwrap()).unwrap();
        assert_eq!(archive.len(), 3);

        let mut content = String::new();
        archive
            .by_name("data/procurement.db")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "db bytes");

        content.clear();
        archive
            .by_name("OppWorks_Procurement/Widget Rollout/Quote/supplier_quote.pdf")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "%PDF-1.4");
    }

    #[test]
    fn test_create_archive_distinct_timestamps_distinct_files() {
        let root = create_root();
        let config = BackupConfig::for_root(root.path());
        config.validate().unwrap();

        let first = config
            .create_archive(Utc.with_ymd_and_hms(2024, 1, 31, 13, 5, 9).unwrap())
            .unwrap();
        let second = config
            .create_archive(Utc.with_ymd_and_hms(2024, 1, 31, 13, 5, 10).unwrap())
            .unwrap();

        assert_ne!(first, second);
        assert!(first.is_file());
        assert!(second.is_file());

        zip::ZipArchive::new(File::open(&first).unwrap()).unwrap();
        zip::ZipArchive::new(File::open(&second).unwrap()).unwrap();
    }

    #[test]
    fn test_create_archive_missing_source_leaves_nothing_behind() {
        let root = TempDir::new().unwrap();
        let config = BackupConfig::for_root(root.path());
        std::fs::create_dir_all(config.out_dir.as_ref()).unwrap();

        let dt = Utc.with_ymd_and_hms(2024, 1, 31, 13, 5, 9).unwrap();
        assert!(config.create_archive(dt).is_err());

        let leftover = std::fs::read_dir(config.out_dir.as_ref()).unwrap().count();
        assert_eq!(leftover, 0);
    }

    #[test]
    fn test_run_backup_reports_absolute_path() {
        let root = create_root();

        let archive_path = run_backup(root.path()).unwrap();
        assert!(archive_path.is_absolute());
        assert!(archive_path.is_file());
        assert_archive_name(archive_path.file_name().unwrap().to_str().unwrap());
    }

    #[test]
    fn test_run_backup_fails_on_missing_root() {
        let root = TempDir::new().unwrap();
        let missing = root.path().join("no_such_root");

        assert!(run_backup(&missing).is_err());
    }
}
