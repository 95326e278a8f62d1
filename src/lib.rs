//! # oppworks-backup
//!
//! A one-shot backup tool for the OppWorks data directories.
//!
//! Walks a fixed set of source directories under a configurable root and
//! snapshots their full contents into a single timestamped zip archive
//! under `<root>/backups/`.
//!
//! ## Quick Start
//!
//! ```no_run
//! use oppworks_backup::backup::backup_config::run_backup;
//!
//! // Pre-check both source trees, then write one timestamped archive
//! let archive_path = run_backup(".")?;
//! println!("Backup written to {}", archive_path.display());
//! # Ok::<(), oppworks_backup::backup::result_error::error::Error>(())
//! ```

pub mod backup;
